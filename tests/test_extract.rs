use graphql_lens::extract::{type_blocks, SchemaExtractor};
use pretty_assertions::assert_eq;

fn fields(extractor: &SchemaExtractor, content: &str, type_name: &str) -> Vec<String> {
    extractor
        .extract(content)
        .fields
        .get(type_name)
        .map(|f| f.iter().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_extracts_types_and_fields() {
    let content = "type Product {\n  id: ID\n  name: String\n}\ntype Query {\n  products: [Product]\n}\n";
    let file = SchemaExtractor::new(2).extract(content);

    assert_eq!(
        file.types.iter().cloned().collect::<Vec<_>>(),
        vec!["Product".to_string(), "Query".to_string()]
    );
    assert_eq!(file.field_count(), 3);
}

#[test]
fn test_field_with_arguments() {
    let content = "type Query {\n  product(id: ID!): Product\n  search (term: String): [Product]\n}";
    let extractor = SchemaExtractor::new(2);

    assert_eq!(fields(&extractor, content, "Query"), vec!["product", "search"]);
}

#[test]
fn test_indentation_depth_is_exact() {
    let content = "type T {\n  two: Int\n    four: Int\n\ttab: Int\n\t\ttwoTabs: Int\nzero: Int\n}";

    let extractor = SchemaExtractor::new(2);
    assert_eq!(fields(&extractor, content, "T"), vec!["tab", "two"]);

    let extractor = SchemaExtractor::new(4);
    assert_eq!(extractor.tab_size(), 4);
    assert_eq!(fields(&extractor, content, "T"), vec!["four", "tab"]);
}

#[test]
fn test_empty_type_is_still_declared() {
    let file = SchemaExtractor::default().extract("type Empty {}\ntype Marker {\n  # no fields yet\n}");

    assert!(file.declares("Empty"));
    assert!(file.declares("Marker"));
    assert_eq!(file.field_count(), 0);
}

#[test]
fn test_extend_type_declares_type() {
    let file = SchemaExtractor::default().extract("extend type Query {\n  me: User\n}");

    assert!(file.declares("Query"));
    assert_eq!(fields(&SchemaExtractor::default(), "extend type Query {\n  me: User\n}", "Query"), vec!["me"]);
}

#[test]
fn test_nested_braces_truncate_body() {
    // The body ends at the first `}`, so `after` is never seen
    let content = "type T {\n  before: Int\n  inline: { x: Int }\n  after: Int\n}";
    let extractor = SchemaExtractor::default();

    assert_eq!(fields(&extractor, content, "T"), vec!["before", "inline"]);
}

#[test]
fn test_other_definitions_are_ignored() {
    let content = "input NewProduct {\n  name: String\n}\nenum Color {\n  RED\n}\ninterface Node {\n  id: ID\n}";
    let file = SchemaExtractor::default().extract(content);

    assert!(file.types.is_empty());
}

#[test]
fn test_names_are_case_sensitive() {
    let content = "type user {\n  id: ID\n}\ntype User {\n  ID: ID\n}";
    let extractor = SchemaExtractor::default();
    let file = extractor.extract(content);

    assert_eq!(file.types.len(), 2);
    assert_eq!(fields(&extractor, content, "user"), vec!["id"]);
    assert_eq!(fields(&extractor, content, "User"), vec!["ID"]);
}

#[test]
fn test_crlf_line_endings() {
    let content = "type T {\r\n  a: Int\r\n  b(x: Int): Int\r\n}\r\n";
    assert_eq!(fields(&SchemaExtractor::default(), content, "T"), vec!["a", "b"]);
}

#[test]
fn test_extraction_is_deterministic() {
    let content = "type B {\n  z: Int\n  a: Int\n}\ntype A {\n  m: Int\n}";
    let extractor = SchemaExtractor::default();

    assert_eq!(extractor.extract(content), extractor.extract(content));
    assert_eq!(fields(&extractor, content, "B"), vec!["a", "z"]);
}

#[test]
fn test_type_block_offsets() {
    let content = "# schema\ntype Query {\n  ok: Boolean\n}";
    let block = type_blocks(content).next().unwrap();

    assert_eq!(block.name, "Query");
    assert_eq!(block.span.start, 9);
    assert_eq!(&content[block.span.clone()], "type Query {\n  ok: Boolean\n}");
}
