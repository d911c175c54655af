//! Cross-module properties of the detection → section planning pipeline.
//!
//! Everything here is pure logic — no pdfium, no OCR binary, no API keys —
//! so these tests run everywhere, unconditionally.

use chartsplit::{plan_sections, BoundaryPolicy, DetectionSet, FilterSpec, Section};

fn detections(indices: &[usize]) -> DetectionSet {
    DetectionSet::from_unordered(indices.to_vec())
}

/// Flatten a plan into the pages it covers, in emission order.
fn covered_pages(sections: &[Section]) -> Vec<usize> {
    sections.iter().flat_map(|s| s.start..s.end).collect()
}

// ── Completeness + exclusivity ───────────────────────────────────────────

#[test]
fn separator_plan_reconstructs_the_document_exactly() {
    // Concatenating the sections in ordinal order must reproduce the page
    // sequence with nothing duplicated and nothing missing, for any
    // detection set.
    let cases: &[(&[usize], usize)] = &[
        (&[], 1),
        (&[], 5),
        (&[0], 5),
        (&[4], 5),
        (&[0, 1, 2, 3, 4], 5),
        (&[0, 3, 7], 10),
        (&[2, 5, 6], 9),
        (&[1], 2),
        (&[9], 10),
    ];
    for &(dets, total) in cases {
        let plan = plan_sections(&detections(dets), total, BoundaryPolicy::Separator);
        assert_eq!(
            covered_pages(&plan),
            (0..total).collect::<Vec<_>>(),
            "detections {dets:?}, {total} pages"
        );
    }
}

#[test]
fn start_plan_covers_everything_from_the_first_detection() {
    let cases: &[(&[usize], usize)] = &[(&[0], 5), (&[2], 5), (&[0, 3, 7], 10), (&[4, 8], 12)];
    for &(dets, total) in cases {
        let plan = plan_sections(&detections(dets), total, BoundaryPolicy::Start);
        let first = dets[0];
        assert_eq!(
            covered_pages(&plan),
            (first..total).collect::<Vec<_>>(),
            "detections {dets:?}, {total} pages"
        );
    }
}

#[test]
fn section_count_is_between_one_and_detections_plus_one() {
    for (dets, total) in [
        (vec![], 5_usize),
        (vec![0_usize], 5),
        (vec![0, 1, 2, 3, 4], 5),
        (vec![3], 10),
        (vec![0, 3, 7], 10),
    ] {
        let k = dets.len();
        let plan = plan_sections(&detections(&dets), total, BoundaryPolicy::Separator);
        assert!(
            (1..=k + 1).contains(&plan.len()),
            "{} sections for k={k}",
            plan.len()
        );
    }
}

// ── Ordinals and naming ──────────────────────────────────────────────────

#[test]
fn ordinals_are_gapless_even_when_candidates_are_dropped() {
    // A detection on page 0 makes the leading separator gap zero-length;
    // the dropped candidate must not leave a hole in the numbering.
    let plan = plan_sections(&detections(&[0, 3, 7]), 10, BoundaryPolicy::Separator);
    let ordinals: Vec<usize> = plan.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
}

#[test]
fn spec_scenario_ten_pages_three_detections() {
    // 10 pages, detections on 1-based pages {1, 4, 8} → three sections
    // covering pages 1-3, 4-7, 8-10.
    let plan = plan_sections(&detections(&[0, 3, 7]), 10, BoundaryPolicy::Separator);
    assert_eq!(plan.len(), 3);

    let names: Vec<String> = plan.iter().map(|s| s.file_name("chart")).collect();
    assert_eq!(
        names,
        vec![
            "chart_section_01_pages_1-3.pdf",
            "chart_section_02_pages_4-7.pdf",
            "chart_section_03_pages_8-10.pdf",
        ]
    );
}

#[test]
fn spec_scenario_five_pages_no_detections() {
    // Zero detections → exactly one fallback file covering pages 1-5.
    for policy in [BoundaryPolicy::Separator, BoundaryPolicy::Start] {
        let plan = plan_sections(&detections(&[]), 5, policy);
        assert_eq!(plan.len(), 1);
        let only = &plan[0];
        assert!(only.fallback);
        assert_eq!((only.first_page(), only.last_page()), (1, 5));
        assert_eq!(only.file_name("scan"), "scan_all_pages.pdf");
    }
}

// ── Planning is deterministic ────────────────────────────────────────────

#[test]
fn planning_twice_yields_identical_boundaries() {
    let d = detections(&[2, 5, 6]);
    for policy in [BoundaryPolicy::Separator, BoundaryPolicy::Start] {
        let a = plan_sections(&d, 9, policy);
        let b = plan_sections(&d, 9, policy);
        assert_eq!(a, b);
    }
}

#[test]
fn unordered_scan_results_plan_like_ordered_ones() {
    // Workers finish in arbitrary order; the detection set normalises.
    let shuffled = DetectionSet::from_unordered(vec![7, 0, 3]);
    let ordered = DetectionSet::from_unordered(vec![0, 3, 7]);
    assert_eq!(
        plan_sections(&shuffled, 10, BoundaryPolicy::Separator),
        plan_sections(&ordered, 10, BoundaryPolicy::Separator)
    );
}

// ── Matching semantics (spec §8) ─────────────────────────────────────────

#[test]
fn matching_is_case_configurable() {
    use chartsplit::pipeline::matcher::page_matches;

    let insensitive = FilterSpec::new(["patient address"], false).unwrap();
    let sensitive = FilterSpec::new(["patient address"], true).unwrap();

    assert!(page_matches("Patient ADDRESS", &insensitive));
    assert!(!page_matches("Patient ADDRESS", &sensitive));
}

#[test]
fn empty_pages_never_detect() {
    use chartsplit::pipeline::matcher::page_matches;

    for case_sensitive in [false, true] {
        let f = FilterSpec::new(["Gender", "Address 1"], case_sensitive).unwrap();
        assert!(!page_matches("", &f));
    }
}

#[test]
fn multi_term_filter_requires_all_terms_anywhere() {
    use chartsplit::pipeline::matcher::page_matches;

    let f = FilterSpec::new(["Gender", "Address 1"], false).unwrap();
    assert!(page_matches(
        "Patient Gender: F\naddress 1: 123 Main St",
        &f
    ));
    assert!(!page_matches("Patient Gender: F\nStreet: 123 Main St", &f));
}
