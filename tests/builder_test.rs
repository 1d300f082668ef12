//! Tests for TreeBuilder

use std::io;

use rstest::rstest;

use plant::domain::{Classifier, Line, NodeKind, PlanTree, TreeBuilder};
use plant::util::testing::{init_test_setup, lines_of, APPLY, PLAN};

fn top_level_texts(tree: &PlanTree) -> Vec<String> {
    tree.children(tree.root())
        .iter()
        .map(|&idx| tree.get_node(idx).unwrap().data.label.display().trim().to_string())
        .collect()
}

#[test]
fn given_resource_block_when_building_then_block_holds_its_attributes() {
    // Arrange
    init_test_setup();
    let input = lines_of(
        "Terraform will perform the following actions:\n\
         \x20 # aws_instance.foo will be created\n\
         \x20 + resource (\n\
         \x20   ami = \"x\"\n\
         \x20 )",
    );

    // Act
    let outcome = TreeBuilder::default().build(input).unwrap();

    // Assert
    let tree = &outcome.tree;
    assert_eq!(outcome.prompt, None);
    assert_eq!(
        top_level_texts(tree),
        vec!["# aws_instance.foo will be created", "+ resource (...)"]
    );

    let top = tree.children(tree.root());
    assert!(!tree.is_selectable(top[0]));
    assert!(tree.is_selectable(top[1]));

    let block = tree.children(top[1]);
    let first = &tree.get_node(block[0]).unwrap().data;
    assert_eq!(first.label.text().trim(), "ami = \"x\"");
    assert_eq!(first.kind, NodeKind::Content);
    // the closing line stays inside the block it closes
    assert_eq!(block.len(), 2);
    assert_eq!(outcome.open_blocks, 0);
}

#[test]
fn given_stream_ending_in_prompt_when_building_then_returns_literal_without_node() {
    // Arrange
    let input = lines_of(APPLY);

    // Act
    let outcome = TreeBuilder::default().build(input).unwrap();

    // Assert
    assert_eq!(
        outcome.prompt.as_deref(),
        Some("Do you want to perform these actions?")
    );
    assert!(outcome
        .tree
        .iter()
        .all(|(_, node)| node.data.label.text() != "Do you want to perform these actions?"));
    assert!(outcome.tree.iter().all(|(_, node)| node.data.kind != NodeKind::Prompt));
}

#[test]
fn given_prompt_when_building_then_lines_after_it_stay_unread() {
    // Arrange
    let mut input = lines_of(APPLY).into_iter();

    // Act
    let outcome = TreeBuilder::default().build(&mut input).unwrap();

    // Assert
    assert!(outcome.prompt.is_some());
    let rest: Vec<String> = input.map(|l| l.unwrap().raw).collect();
    assert_eq!(rest.first().map(String::as_str), Some("  Terraform will perform the actions described above."));
}

#[rstest]
#[case::plan(PLAN, 15)]
#[case::apply(APPLY, 8)]
#[case::no_marker("just some output\nwith {\n}\n", 0)]
#[case::marker_only("Terraform will perform the following actions:\n", 0)]
fn given_stream_when_building_then_one_node_per_line_between_marker_and_prompt(
    #[case] text: &str,
    #[case] expected: usize,
) {
    let outcome = TreeBuilder::default().build(lines_of(text)).unwrap();
    assert_eq!(outcome.tree.len(), expected);
}

#[test]
fn given_well_nested_plan_when_building_then_stack_returns_to_root() {
    // Act
    let outcome = TreeBuilder::default().build(lines_of(PLAN)).unwrap();

    // Assert
    let tree = &outcome.tree;
    assert_eq!(outcome.open_blocks, 0);
    assert_eq!(tree.children(tree.root()).len(), 9);
    assert_eq!(tree.depth(), 3);
}

#[test]
fn given_line_both_opener_and_closer_when_building_then_single_selectable_node_at_same_depth() {
    // Arrange
    let input = lines_of(
        "Terraform will perform the following actions:\n\
         list = [\n\
         \x20 ] + [\n\
         \x20 \"a\"\n\
         ]\n\
         after",
    );

    // Act
    let outcome = TreeBuilder::default().build(input).unwrap();

    // Assert
    let tree = &outcome.tree;
    assert_eq!(tree.len(), 5);
    let top = tree.children(tree.root());
    assert_eq!(top.len(), 2);
    let inner = tree.children(top[0]);
    assert_eq!(inner.len(), 3);
    // pushed and popped right away: selectable but childless
    assert!(tree.is_selectable(inner[0]));
    assert!(tree.children(inner[0]).is_empty());
    assert_eq!(outcome.open_blocks, 0);
}

#[test]
fn given_stray_closer_when_building_then_clamped_at_root() {
    // Arrange
    let input = lines_of("Terraform will perform the following actions:\n}\n)\nstill here");

    // Act
    let outcome = TreeBuilder::default().build(input).unwrap();

    // Assert
    assert_eq!(top_level_texts(&outcome.tree), vec!["}", ")", "still here"]);
    assert_eq!(outcome.open_blocks, 0);
}

#[test]
fn given_truncated_plan_when_building_then_reports_open_blocks() {
    let input = lines_of("Terraform will perform the following actions:\nresource {\n  tags = {");
    let outcome = TreeBuilder::default().build(input).unwrap();
    assert_eq!(outcome.open_blocks, 2);
}

#[test]
fn given_colored_input_when_building_then_classifies_raw_and_keeps_colors() {
    // Arrange
    let input = lines_of(
        "\u{1b}[1mTerraform will perform the following actions:\u{1b}[0m\n\
         \x20 \u{1b}[32m+\u{1b}[0m resource \"aws_s3_bucket\" \"b\" {\u{1b}[0m",
    );

    // Act
    let outcome = TreeBuilder::default().build(input).unwrap();

    // Assert
    let tree = &outcome.tree;
    let block = tree.children(tree.root())[0];
    assert!(tree.is_selectable(block));
    let label = &tree.get_node(block).unwrap().data.label;
    assert!(label.text().contains("\u{1b}[32m"));
    assert!(label.display().ends_with("...}"));
}

#[test]
fn given_custom_prompt_when_building_then_stops_there() {
    // Arrange
    let classifier = Classifier::new(
        vec!["BEGIN".into()],
        vec![],
        vec!["Proceed?".into()],
    );
    let input = lines_of("noise\nBEGIN plan\na\nProceed?\nb");

    // Act
    let outcome = TreeBuilder::new(classifier).build(input).unwrap();

    // Assert
    assert_eq!(outcome.prompt.as_deref(), Some("Proceed?"));
    assert_eq!(top_level_texts(&outcome.tree), vec!["a"]);
}

#[test]
fn given_suffix_marker_when_building_then_region_starts_after_it() {
    let input = lines_of(
        "Note: Objects have changed outside of Terraform\n\
         drifted\n",
    );
    let outcome = TreeBuilder::default().build(input).unwrap();
    assert_eq!(top_level_texts(&outcome.tree), vec!["drifted"]);
}

#[test]
fn given_read_failure_when_building_then_error_propagates() {
    // Arrange
    let input: Vec<io::Result<Line>> = vec![
        Ok(Line::from_colored("Terraform will perform the following actions:")),
        Ok(Line::from_colored("a")),
        Err(io::Error::new(io::ErrorKind::InvalidData, "stream broke")),
        Ok(Line::from_colored("never read")),
    ];

    // Act
    let result = TreeBuilder::default().build(input);

    // Assert
    let err = result.unwrap_err();
    assert!(err.to_string().contains("stream broke"));
}
