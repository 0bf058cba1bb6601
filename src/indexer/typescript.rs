//! Shared TypeScript/JavaScript extractor (§4.2.1). One extractor, one
//! grammar family; only the `language` field differs, driven by extension
//! (`.js`/`.jsx`/`.mjs`/`.cjs` -> javascript, everything else -> typescript).

use tree_sitter::Node as TsNode;

use crate::indexer::common::{
    contains_edge, file_node, line_end, line_start, node_text, strip_generics, CallDedup,
    ExtractResult,
};
use crate::indexer::parser::CodeParser;
use crate::types::{make_ref, Edge, EdgeKind, Language, Node, NodeKind, RefCategory};

pub fn language_for_path(file_path: &str) -> Language {
    if file_path.ends_with(".js")
        || file_path.ends_with(".jsx")
        || file_path.ends_with(".mjs")
        || file_path.ends_with(".cjs")
    {
        Language::JavaScript
    } else {
        Language::TypeScript
    }
}

pub fn extract(file_path: &str, content: &str) -> crate::error::Result<ExtractResult> {
    let language = language_for_path(file_path);
    let parser = CodeParser::new();
    // TS and JS share one extractor; TSX/JSX syntax within .tsx/.jsx files
    // parses fine under the plain typescript/javascript grammars for the
    // subset of constructs this extractor inspects (declarations, imports,
    // calls) even though it does not specially model JSX nodes.
    let tree = parser.parse(content, language)?;
    let root = tree.root_node();

    let mut result = ExtractResult::default();
    let total_lines = content.lines().count() as u32;
    let file_id = result.push_node(file_node(file_path, total_lines, language));

    let mut cursor = root.walk();
    let mut pending_decorators: Vec<String> = Vec::new();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "decorator" => {
                pending_decorators.push(node_text(child, content).to_string());
                continue;
            }
            "import_statement" => {
                extract_import(child, content, file_path, language, &mut result);
            }
            "export_statement" => {
                extract_export_statement(
                    child,
                    content,
                    file_path,
                    language,
                    &file_id,
                    &mut pending_decorators,
                    &mut result,
                );
            }
            "class_declaration" | "abstract_class_declaration" => {
                extract_class(
                    child,
                    content,
                    file_path,
                    language,
                    &file_id,
                    false,
                    std::mem::take(&mut pending_decorators),
                    &mut result,
                );
            }
            "interface_declaration" => {
                extract_interface(child, content, file_path, language, &file_id, false, &mut result);
            }
            "function_declaration" => {
                extract_function(child, content, file_path, language, &file_id, false, &mut result);
            }
            "lexical_declaration" | "variable_declaration" => {
                extract_variable_declaration(
                    child,
                    content,
                    file_path,
                    language,
                    &file_id,
                    false,
                    &mut result,
                );
            }
            _ => {}
        }
        pending_decorators.clear();
    }

    Ok(result)
}

fn extract_export_statement(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    file_id: &str,
    decorators: &mut Vec<String>,
    result: &mut ExtractResult,
) {
    // Also emit a plain `export` node representing the export statement
    // itself (§4.2.1 "export nodes").
    let export_node = Node::new(
        NodeKind::Export,
        "export",
        file_path,
        line_start(node),
        line_end(node),
        language,
    );
    let export_id = result.push_node(export_node);
    result.push_edge(contains_edge(file_id, &export_id));

    if let Some(decl) = node.child_by_field_name("declaration") {
        match decl.kind() {
            "class_declaration" | "abstract_class_declaration" => extract_class(
                decl,
                content,
                file_path,
                language,
                file_id,
                true,
                std::mem::take(decorators),
                result,
            ),
            "interface_declaration" => {
                extract_interface(decl, content, file_path, language, file_id, true, result)
            }
            "function_declaration" => {
                extract_function(decl, content, file_path, language, file_id, true, result)
            }
            "lexical_declaration" | "variable_declaration" => extract_variable_declaration(
                decl, content, file_path, language, file_id, true, result,
            ),
            _ => {}
        }
    }
}

fn extract_import(node: TsNode, content: &str, file_path: &str, language: Language, result: &mut ExtractResult) {
    let source = node
        .child_by_field_name("source")
        .map(|n| node_text(n, content).trim_matches(|c| c == '"' || c == '\'').to_string())
        .unwrap_or_default();

    let mut named_imports = Vec::new();
    let mut default_import: Option<String> = None;

    if let Some(clause) = node.children(&mut node.walk()).find(|c| c.kind() == "import_clause") {
        let mut clause_cursor = clause.walk();
        for part in clause.children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => default_import = Some(node_text(part, content).to_string()),
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.children(&mut spec_cursor) {
                        if spec.kind() == "import_specifier" {
                            let name = spec
                                .child_by_field_name("name")
                                .map(|n| node_text(n, content).to_string())
                                .unwrap_or_default();
                            named_imports.push(name);
                        }
                    }
                }
                "namespace_import" => {
                    named_imports.push(node_text(part, content).to_string());
                }
                _ => {}
            }
        }
    }

    let node_name = if source.is_empty() { "import".to_string() } else { source.clone() };
    let mut import_node = Node::new(
        NodeKind::Import,
        node_name,
        file_path,
        line_start(node),
        line_end(node),
        language,
    )
    .with_metadata("moduleSpecifier", serde_json::json!(source))
    .with_metadata("namedImports", serde_json::json!(named_imports));
    if let Some(default) = &default_import {
        import_node = import_node.with_metadata("defaultImport", serde_json::json!(default));
    }
    result.push_node(import_node);
}

fn collect_decorators(node: TsNode, content: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "decorator" {
            decorators.insert(0, node_text(s, content).to_string());
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    decorators
}

fn extract_class(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    owner_id: &str,
    is_exported: bool,
    mut decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if decorators.is_empty() {
        decorators = collect_decorators(node, content);
    }
    let is_abstract = node.kind() == "abstract_class_declaration";

    let class_node = Node::new(NodeKind::Class, &name, file_path, line_start(node), line_end(node), language)
        .with_metadata("isExported", serde_json::json!(is_exported))
        .with_metadata("isAbstract", serde_json::json!(is_abstract))
        .with_metadata("decorators", serde_json::json!(decorators));
    let class_id = result.push_node(class_node);
    result.push_edge(contains_edge(owner_id, &class_id));

    if let Some(heritage) = node.child_by_field_name("heritage").or_else(|| {
        node.children(&mut node.walk()).find(|c| c.kind() == "class_heritage")
    }) {
        let mut hcursor = heritage.walk();
        for part in heritage.children(&mut hcursor) {
            match part.kind() {
                "extends_clause" => {
                    if let Some(value) = part.named_child(0) {
                        let base = strip_generics(node_text(value, content)).to_string();
                        let target = make_ref(RefCategory::Class, &base);
                        result.push_edge(
                            Edge::new(class_id.clone(), target, EdgeKind::Extends)
                                .with_metadata("unresolved", serde_json::json!(true))
                                .with_metadata("targetName", serde_json::json!(base)),
                        );
                    }
                }
                "implements_clause" => {
                    let mut icursor = part.walk();
                    for iface in part.named_children(&mut icursor) {
                        let iface_name = strip_generics(node_text(iface, content)).to_string();
                        let target = make_ref(RefCategory::Interface, &iface_name);
                        result.push_edge(
                            Edge::new(class_id.clone(), target, EdgeKind::Implements)
                                .with_metadata("unresolved", serde_json::json!(true))
                                .with_metadata("targetName", serde_json::json!(iface_name)),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut bcursor = body.walk();
        let mut pending: Vec<String> = Vec::new();
        for member in body.children(&mut bcursor) {
            match member.kind() {
                "decorator" => pending.push(node_text(member, content).to_string()),
                "method_definition" => {
                    extract_method(member, content, file_path, language, &name, &class_id, std::mem::take(&mut pending), result);
                }
                "public_field_definition" | "field_definition" => {
                    extract_property(member, content, file_path, language, &name, &class_id, std::mem::take(&mut pending), result);
                }
                _ => {
                    pending.clear();
                }
            }
        }
    }
}

fn modifier_present(node: TsNode, text: &str, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && node_text(c, text) == keyword)
}

fn extract_method(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    class_name: &str,
    class_id: &str,
    mut decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    if decorators.is_empty() {
        decorators = collect_decorators(node, content);
    }

    let is_static = modifier_present(node, content, "static");
    let is_async = modifier_present(node, content, "async");
    let visibility = ["public", "private", "protected"]
        .into_iter()
        .find(|kw| modifier_present(node, content, kw))
        .unwrap_or("public")
        .to_string();

    let parameters = extract_parameters(node, content);
    let return_type = node
        .child_by_field_name("return_type")
        .map(|n| node_text(n, content).trim_start_matches(':').trim().to_string());

    let qualified = Node::owner_qualified(class_name, &name);
    let mut method_node = Node::new(
        NodeKind::Method,
        qualified,
        file_path,
        line_start(node),
        line_end(node),
        language,
    )
    .with_metadata("isStatic", serde_json::json!(is_static))
    .with_metadata("isAsync", serde_json::json!(is_async))
    .with_metadata("visibility", serde_json::json!(visibility))
    .with_metadata("parameters", serde_json::json!(parameters))
    .with_metadata("decorators", serde_json::json!(decorators));
    if let Some(rt) = &return_type {
        method_node = method_node.with_metadata("returnType", serde_json::json!(rt));
    }
    let method_id = result.push_node(method_node);
    result.push_edge(contains_edge(class_id, &method_id));

    if let Some(body) = node.child_by_field_name("body") {
        let mut dedup = CallDedup::new();
        collect_calls(body, content, &method_id, &mut dedup, result);
    }
}

fn extract_property(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    class_name: &str,
    class_id: &str,
    decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .or_else(|| node.child_by_field_name("property"))
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return;
    }
    let is_static = modifier_present(node, content, "static");
    let visibility = ["public", "private", "protected"]
        .into_iter()
        .find(|kw| modifier_present(node, content, kw))
        .unwrap_or("public")
        .to_string();
    let type_annotation = node
        .child_by_field_name("type")
        .map(|n| node_text(n, content).trim_start_matches(':').trim().to_string());

    let qualified = Node::owner_qualified(class_name, &name);
    let mut prop_node = Node::new(
        NodeKind::Variable,
        qualified,
        file_path,
        line_start(node),
        line_end(node),
        language,
    )
    .with_metadata("isStatic", serde_json::json!(is_static))
    .with_metadata("visibility", serde_json::json!(visibility))
    .with_metadata("decorators", serde_json::json!(decorators));
    if let Some(t) = &type_annotation {
        prop_node = prop_node.with_metadata("type", serde_json::json!(t));
    }
    let prop_id = result.push_node(prop_node);
    result.push_edge(contains_edge(class_id, &prop_id));
}

fn extract_interface(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    owner_id: &str,
    is_exported: bool,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let mut properties = Vec::new();
    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut bcursor = body.walk();
        for member in body.children(&mut bcursor) {
            match member.kind() {
                "property_signature" => {
                    if let Some(n) = member.child_by_field_name("name") {
                        properties.push(node_text(n, content).to_string());
                    }
                }
                "method_signature" => {
                    if let Some(n) = member.child_by_field_name("name") {
                        methods.push(node_text(n, content).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    let iface_node = Node::new(NodeKind::Interface, &name, file_path, line_start(node), line_end(node), language)
        .with_metadata("isExported", serde_json::json!(is_exported))
        .with_metadata("properties", serde_json::json!(properties))
        .with_metadata("methods", serde_json::json!(methods));
    let iface_id = result.push_node(iface_node);
    result.push_edge(contains_edge(owner_id, &iface_id));

    let mut cursor = node.walk();
    for part in node.children(&mut cursor) {
        if part.kind() == "extends_type_clause" || part.kind() == "extends_clause" {
            let mut pc = part.walk();
            for target in part.named_children(&mut pc) {
                let base = strip_generics(node_text(target, content)).to_string();
                let target_ref = make_ref(RefCategory::Interface, &base);
                result.push_edge(
                    Edge::new(iface_id.clone(), target_ref, EdgeKind::Extends)
                        .with_metadata("unresolved", serde_json::json!(true))
                        .with_metadata("targetName", serde_json::json!(base)),
                );
            }
        }
    }
}

fn extract_parameters(node: TsNode, content: &str) -> Vec<serde_json::Value> {
    let mut params = Vec::new();
    if let Some(param_list) = node.child_by_field_name("parameters") {
        let mut cursor = param_list.walk();
        for param in param_list.named_children(&mut cursor) {
            let name_node = param
                .child_by_field_name("pattern")
                .or_else(|| param.child_by_field_name("name"));
            let name = name_node
                .map(|n| node_text(n, content).to_string())
                .unwrap_or_else(|| node_text(param, content).to_string());
            let param_type = param
                .child_by_field_name("type")
                .map(|n| node_text(n, content).trim_start_matches(':').trim().to_string());
            params.push(serde_json::json!({ "name": name, "type": param_type }));
        }
    }
    params
}

fn extract_function(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    owner_id: &str,
    is_exported: bool,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    let is_async = modifier_present(node, content, "async");
    let parameters = extract_parameters(node, content);
    let return_type = node
        .child_by_field_name("return_type")
        .map(|n| node_text(n, content).trim_start_matches(':').trim().to_string());

    let mut func_node = Node::new(NodeKind::Function, &name, file_path, line_start(node), line_end(node), language)
        .with_metadata("isExported", serde_json::json!(is_exported))
        .with_metadata("isAsync", serde_json::json!(is_async))
        .with_metadata("isArrowFunction", serde_json::json!(false))
        .with_metadata("parameters", serde_json::json!(parameters));
    if let Some(rt) = &return_type {
        func_node = func_node.with_metadata("returnType", serde_json::json!(rt));
    }
    let func_id = result.push_node(func_node);
    result.push_edge(contains_edge(owner_id, &func_id));

    if let Some(body) = node.child_by_field_name("body") {
        let mut dedup = CallDedup::new();
        collect_calls(body, content, &func_id, &mut dedup, result);
    }
}

fn extract_variable_declaration(
    node: TsNode,
    content: &str,
    file_path: &str,
    language: Language,
    owner_id: &str,
    is_exported: bool,
    result: &mut ExtractResult,
) {
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(value) = declarator.child_by_field_name("value") else { continue };
        if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
            continue;
        }
        let name = declarator
            .child_by_field_name("name")
            .map(|n| node_text(n, content).to_string())
            .unwrap_or_default();
        let is_arrow = value.kind() == "arrow_function";
        let is_async = modifier_present(value, content, "async");
        let parameters = extract_parameters(value, content);
        let return_type = value
            .child_by_field_name("return_type")
            .map(|n| node_text(n, content).trim_start_matches(':').trim().to_string());

        let mut func_node = Node::new(
            NodeKind::Function,
            &name,
            file_path,
            line_start(declarator),
            line_end(declarator),
            language,
        )
        .with_metadata("isExported", serde_json::json!(is_exported))
        .with_metadata("isAsync", serde_json::json!(is_async))
        .with_metadata("isArrowFunction", serde_json::json!(is_arrow))
        .with_metadata("parameters", serde_json::json!(parameters));
        if let Some(rt) = &return_type {
            func_node = func_node.with_metadata("returnType", serde_json::json!(rt));
        }
        let func_id = result.push_node(func_node);
        result.push_edge(contains_edge(owner_id, &func_id));

        let body = value.child_by_field_name("body");
        if let Some(body) = body {
            let mut dedup = CallDedup::new();
            collect_calls(body, content, &func_id, &mut dedup, result);
        }
    }
}

/// Walk a function/method body for `calls` edges, stopping at nested
/// declarations that get their own owner (so their calls aren't
/// double-attributed once they're extracted independently).
fn collect_calls(node: TsNode, content: &str, owner_id: &str, dedup: &mut CallDedup, result: &mut ExtractResult) {
    if node.kind() == "call_expression" {
        if let Some(callee) = node.child_by_field_name("function") {
            let call_name = node_text(callee, content).to_string();
            if dedup.first_time(&call_name) {
                let target = make_ref(RefCategory::Function, &call_name);
                result.push_edge(
                    Edge::new(owner_id, target, EdgeKind::Calls)
                        .with_metadata("unresolved", serde_json::json!(true))
                        .with_metadata("targetName", serde_json::json!(call_name))
                        .with_metadata("line", serde_json::json!(line_start(node))),
                );
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "class_declaration" | "abstract_class_declaration" | "interface_declaration" | "function_declaration" | "method_definition"
        ) {
            continue;
        }
        collect_calls(child, content, owner_id, dedup, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_with_extends_and_method() {
        let src = r#"
export class Dog extends Animal {
    bark(): void {
        this.log("woof");
    }
}
"#;
        let result = extract("src/dog.ts", src).unwrap();
        let class = result.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "Dog");
        let extends = result.edges.iter().find(|e| e.kind == EdgeKind::Extends).unwrap();
        assert_eq!(extends.target_id, "ref:class:Animal");

        let method = result.nodes.iter().find(|n| n.kind == NodeKind::Method).unwrap();
        assert_eq!(method.name, "Dog.bark");
        let calls: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target_id, "ref:function:this.log");
    }

    #[test]
    fn language_is_javascript_for_js_extension() {
        let result = extract("src/a.js", "function f() {}").unwrap();
        let f = result.nodes.iter().find(|n| n.kind == NodeKind::Function).unwrap();
        assert_eq!(f.language, Language::JavaScript);
    }

    #[test]
    fn arrow_function_variable_becomes_function_node() {
        let src = "const add = (a, b) => a + b;";
        let result = extract("src/a.ts", src).unwrap();
        let f = result.nodes.iter().find(|n| n.kind == NodeKind::Function).unwrap();
        assert_eq!(f.name, "add");
        assert_eq!(f.metadata.get("isArrowFunction").unwrap(), &serde_json::json!(true));
    }

    #[test]
    fn duplicate_calls_collapse_to_one_edge() {
        let src = r#"
function f() {
    doThing();
    doThing();
}
"#;
        let result = extract("src/a.ts", src).unwrap();
        let calls: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn implements_clause_emits_interface_refs() {
        let src = "class Foo implements Shape, Sized {}";
        let result = extract("src/a.ts", src).unwrap();
        let implements: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Implements).collect();
        assert_eq!(implements.len(), 2);
    }
}
