//! Section planning: turn an ordered detection set into contiguous,
//! non-overlapping page ranges.
//!
//! The only stateful logic in the pipeline lives here, and it is pure:
//! `(detections, total_pages, policy) → Vec<Section>`, no I/O. The writer
//! materialises the plan afterwards.

use crate::config::BoundaryPolicy;
use crate::pipeline::scan::DetectionSet;
use serde::Serialize;

/// A half-open page range `[start, end)` to be emitted as one output PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// 1-based position among emitted sections; strictly increasing in page
    /// order with no gaps, even when zero-length candidate ranges were
    /// dropped during planning.
    pub ordinal: usize,
    /// First page of the range, 0-based inclusive.
    pub start: usize,
    /// End of the range, 0-based exclusive.
    pub end: usize,
    /// Whether this is the whole-document fallback for a detection-free scan.
    pub fallback: bool,
}

impl Section {
    pub fn page_count(&self) -> usize {
        self.end - self.start
    }

    /// First page, 1-based, for filenames and progress output.
    pub fn first_page(&self) -> usize {
        self.start + 1
    }

    /// Last page, 1-based inclusive.
    pub fn last_page(&self) -> usize {
        self.end
    }

    /// Output filename: `{stem}_section_{NN}_pages_{S}-{E}.pdf`, or
    /// `{stem}_all_pages.pdf` for the no-detection fallback.
    pub fn file_name(&self, stem: &str) -> String {
        if self.fallback {
            format!("{stem}_all_pages.pdf")
        } else {
            format!(
                "{stem}_section_{:02}_pages_{}-{}.pdf",
                self.ordinal,
                self.first_page(),
                self.last_page()
            )
        }
    }
}

/// Plan the sections of a document under the given boundary policy.
///
/// Guarantees, for any valid input (`detections` ascending, unique, all
/// `< total_pages`, and `total_pages > 0`):
///
/// * at least one section is returned — an empty detection set yields the
///   single whole-document fallback section under either policy;
/// * sections are non-empty, non-overlapping, and ascending;
/// * ordinals are 1-based and gapless;
/// * under [`BoundaryPolicy::Separator`] the sections cover every page
///   exactly once; under [`BoundaryPolicy::Start`] pages before the first
///   detection are omitted (cover-sheet preamble), the rest covered exactly
///   once.
pub fn plan_sections(
    detections: &DetectionSet,
    total_pages: usize,
    policy: BoundaryPolicy,
) -> Vec<Section> {
    if total_pages == 0 {
        return Vec::new();
    }

    if detections.is_empty() {
        return vec![Section {
            ordinal: 1,
            start: 0,
            end: total_pages,
            fallback: true,
        }];
    }

    let starts: Vec<usize> = match policy {
        BoundaryPolicy::Separator => {
            // Boundaries are {0} ∪ detections; a detection on page 0
            // duplicates the leading boundary and the zero-length gap is
            // dropped below.
            let mut b = Vec::with_capacity(detections.len() + 1);
            b.push(0);
            b.extend_from_slice(detections.indices());
            b
        }
        BoundaryPolicy::Start => detections.indices().to_vec(),
    };

    let mut sections = Vec::with_capacity(starts.len());
    let mut ordinal = 0;
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(total_pages);
        if start == end {
            continue;
        }
        ordinal += 1;
        sections.push(Section {
            ordinal,
            start,
            end,
            fallback: false,
        });
    }
    sections
}
