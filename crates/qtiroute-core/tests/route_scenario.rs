use std::collections::HashSet;

use qtiroute_core::{
    BranchingViolation, ContentDocument, ErrorKind, ItemRefDocument, ItemSessionControl,
    NavigationMode, Route, RouteBuilder, RouteError, SectionDocument, Step,
    StructuralComponentMut, SubmissionMode, TestDefinition, TestDocument, TestPartDocument,
    TimeLimits,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Q01 twice under S1/P1 (linear, individual), Q02 once under S2/P2.
fn scenario_document() -> TestDocument {
    TestDocument {
        identifier: "T".to_string(),
        title: Some("Scenario".to_string()),
        time_limits: None,
        item_session_control: None,
        items: vec![
            ItemRefDocument::new("Q01"),
            ItemRefDocument {
                categories: vec!["reading".to_string()],
                ..ItemRefDocument::new("Q02")
            },
        ],
        test_parts: vec![
            TestPartDocument::new(
                "P1",
                vec![ContentDocument::Section(SectionDocument::new(
                    "S1",
                    vec![ContentDocument::item("Q01"), ContentDocument::item("Q01")],
                ))],
            ),
            TestPartDocument::new(
                "P2",
                vec![ContentDocument::Section(SectionDocument::new(
                    "S2",
                    vec![ContentDocument::item("Q02")],
                ))],
            ),
        ],
    }
}

/// Position of `step` in `route`, by address.
fn position(route: &Route, step: &Step) -> usize {
    route
        .steps()
        .iter()
        .position(|candidate| std::ptr::eq(candidate, step))
        .expect("step belongs to route")
}

fn scenario() -> (TestDefinition, Route) {
    let definition =
        TestDefinition::from_document(scenario_document()).expect("valid scenario document");
    let route = RouteBuilder::from_definition(&definition).expect("route builds");
    (definition, route)
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[test]
fn scenario_occurrences_and_modes() {
    let (_definition, route) = scenario();

    assert_eq!(route.len(), 3);
    assert_eq!(route.occurrence_count("Q01"), 2);
    assert_eq!(route.occurrence_count("Q02"), 1);
    assert_eq!(route.identifier_sequence(), vec!["Q01.0", "Q01.1", "Q02.0"]);

    let first = route.current().expect("non-empty route");
    assert_eq!(first.navigation_mode(), NavigationMode::Linear);
    assert_eq!(first.submission_mode(), SubmissionMode::Individual);
    assert_eq!(route.categories(), &["reading"]);
}

#[test]
fn scenario_branch_to_section_in_other_part_fails() {
    let (_definition, mut route) = scenario();

    let err = route.branch("S2").expect_err("S2 lies in P2");
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    assert!(matches!(
        err,
        RouteError::Branching(BranchingViolation::LeavesTestPart { .. })
    ));
    assert_eq!(route.position(), 0);
}

#[test]
fn scenario_branch_to_other_part_lands_on_first_step() {
    let (_definition, mut route) = scenario();

    assert_eq!(route.branch("P2").expect("P2 is another part"), 2);
    let landed = route.current().expect("valid cursor");
    assert_eq!(landed.occurrence().identifier(), "Q02.0");
    assert!(route.is_first_of_test_part().expect("valid cursor"));
    assert!(route.is_last());
}

#[test]
fn scenario_branch_within_part_by_occurrence() {
    let (_definition, mut route) = scenario();

    assert_eq!(route.branch("Q01.2").expect("second occurrence"), 1);
    let err = route.branch("P1").expect_err("self branch");
    assert!(matches!(
        err,
        RouteError::Branching(BranchingViolation::SameTestPart { .. })
    ));
    assert_eq!(route.position(), 1);
}

// ---------------------------------------------------------------------------
// Index consistency
// ---------------------------------------------------------------------------

#[test]
fn every_step_is_indexed_under_its_part_and_sections_only() {
    let (_definition, route) = scenario();

    for part in route.test_part_identifiers() {
        let bucket: Vec<usize> = route
            .steps_by_test_part(part)
            .expect("known part")
            .iter()
            .map(|step| position(&route, step))
            .collect();
        let expected: Vec<usize> = (0..route.len())
            .filter(|&i| route.get(i).expect("in range").test_part().identifier() == part)
            .collect();
        assert_eq!(bucket, expected, "test part {part}");
    }

    for section in route.section_identifiers() {
        let bucket: Vec<usize> = route
            .steps_by_section(section)
            .expect("known section")
            .iter()
            .map(|step| position(&route, step))
            .collect();
        let expected: Vec<usize> = (0..route.len())
            .filter(|&i| {
                let step = route.get(i).expect("in range");
                step.sections().iter().any(|s| s.identifier() == section)
            })
            .collect();
        assert_eq!(bucket, expected, "section {section}");
    }

    let s2: Vec<String> = route
        .steps_by_section("S2")
        .expect("S2")
        .iter()
        .map(|step| step.occurrence().identifier())
        .collect();
    assert_eq!(s2, vec!["Q02.0"]);

    let indexed_by_part: usize = route
        .test_part_identifiers()
        .iter()
        .map(|p| route.steps_by_test_part(p).expect("known part").len())
        .sum();
    assert_eq!(indexed_by_part, route.len());
}

#[test]
fn occurrence_identifiers_stay_unique_after_composition() {
    let (_definition, first) = scenario();
    let (_definition, second) = scenario();

    let mut combined = Route::new();
    combined.append_route(&first).expect("append first");
    combined.append_route(&second).expect("append second");

    // Separately loaded definitions give distinct items sharing identifiers;
    // numbering continues across them.
    assert_eq!(combined.len(), 6);
    assert_eq!(combined.occurrence_count("Q01"), 4);
    assert_eq!(combined.steps_by_test_part("P1").expect("P1").len(), 4);
    assert_eq!(
        combined.identifier_sequence(),
        vec!["Q01.0", "Q01.1", "Q02.0", "Q01.2", "Q01.3", "Q02.1"]
    );
    let distinct: HashSet<String> = combined.identifier_sequence().into_iter().collect();
    assert_eq!(distinct.len(), combined.len());
    assert_eq!(combined.position_of("Q01.3").expect("appended"), 4);
    assert_eq!(first.identifier_sequence(), vec!["Q01.0", "Q01.1", "Q02.0"]);
}

#[test]
fn appending_a_route_to_itself_continues_numbering() {
    let (_definition, route) = scenario();
    let mut doubled = Route::new();
    doubled.append_route(&route).expect("append");
    doubled.append_route(&route).expect("append again");

    assert_eq!(doubled.occurrence_count("Q01"), 4);
    assert_eq!(
        doubled.identifier_sequence(),
        vec!["Q01.0", "Q01.1", "Q02.0", "Q01.2", "Q01.3", "Q02.1"]
    );
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

#[test]
fn cursor_boundaries() {
    let (_definition, mut route) = scenario();

    route.previous();
    assert_eq!(route.position(), 0);

    for _ in 0..route.len() + 2 {
        route.next();
    }
    assert!(!route.valid());
    assert!(route.current().is_err());

    route.rewind();
    assert_eq!(route.position(), 0);
    assert!(route.valid());
}

// ---------------------------------------------------------------------------
// Effective policies
// ---------------------------------------------------------------------------

#[test]
fn section_session_control_beats_test_part() {
    let mut definition =
        TestDefinition::from_document(scenario_document()).expect("valid document");
    let p1 = definition.test_part_by_identifier("P1").expect("P1").id();
    let s1 = definition.section_by_identifier("S1").expect("S1").id();

    definition
        .test_part_mut(p1)
        .expect("P1")
        .set_item_session_control(Some(ItemSessionControl::default().with_max_attempts(5)));
    definition
        .section_mut(s1)
        .expect("S1")
        .set_item_session_control(Some(ItemSessionControl::default().with_max_attempts(2)));

    let route = RouteBuilder::from_definition(&definition).expect("route builds");
    let (owner, control) = route
        .current()
        .expect("first step")
        .effective_session_control()
        .expect("declared");
    assert_eq!(owner.identifier(), "S1");
    assert_eq!(control.max_attempts, 2);
}

#[test]
fn item_policies_apply_to_every_occurrence() {
    let mut definition =
        TestDefinition::from_document(scenario_document()).expect("valid document");
    let q01 = definition.item_ref_by_identifier("Q01").expect("Q01").id();
    definition
        .item_ref_mut(q01)
        .expect("Q01")
        .set_item_session_control(Some(
            ItemSessionControl::default()
                .with_allow_skipping(false)
                .with_validate_responses(true),
        ));

    let route = RouteBuilder::from_definition(&definition).expect("route builds");
    let owners: Vec<String> = route
        .steps_by_item_ref("Q01")
        .expect("Q01")
        .iter()
        .map(|step| {
            let (owner, control) = step.effective_session_control().expect("declared");
            assert!(!control.allow_skipping);
            assert!(control.validate_responses);
            owner.identifier()
        })
        .collect();
    assert_eq!(owners, vec!["Q01.0", "Q01.1"]);
    assert!(route
        .steps_by_item_ref("Q02")
        .expect("Q02")[0]
        .effective_session_control()
        .is_none());
}

#[test]
fn test_and_section_time_limits_accumulate() {
    let mut definition =
        TestDefinition::from_document(scenario_document()).expect("valid document");
    let s1 = definition.section_by_identifier("S1").expect("S1").id();

    definition
        .test_mut()
        .set_time_limits(Some(TimeLimits::max(3600)));
    definition
        .section_mut(s1)
        .expect("S1")
        .set_time_limits(Some(TimeLimits::max(600)));

    let route = RouteBuilder::from_definition(&definition).expect("route builds");
    let limits = route.current().expect("first step").effective_time_limits(false);
    let owners: Vec<String> = limits.iter().map(|(owner, _)| owner.identifier()).collect();
    assert_eq!(owners, vec!["T", "S1"]);
    assert_eq!(limits[1].1.max_time_secs, Some(600));
}

#[test]
fn renaming_after_build_leaves_route_untouched() {
    let (mut definition, route) = scenario();
    let s1 = definition.section_by_identifier("S1").expect("S1").id();
    definition.rename_section(s1, "S1-renamed").expect("rename");

    assert!(route.steps_by_section("S1").is_ok());
    assert!(route.steps_by_section("S1-renamed").is_err());

    let rebuilt = RouteBuilder::from_definition(&definition).expect("route builds");
    assert_eq!(rebuilt.steps_by_section("S1-renamed").expect("renamed").len(), 2);
    assert!(rebuilt.steps_by_section("S1").is_err());
}
