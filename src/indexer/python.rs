//! Python extractor (§4.2.2): tree-walking CST over `tree-sitter-python`.

use tree_sitter::Node as TsNode;

use crate::indexer::common::{
    contains_edge, file_node, line_end, line_start, node_text, strip_generics, CallDedup,
    ExtractResult,
};
use crate::indexer::parser::CodeParser;
use crate::types::{make_ref, Edge, EdgeKind, Language, Node, NodeKind, RefCategory};

/// Builtins too trivial to track as unresolved `calls` targets (§4.2 Python
/// skip list).
const BUILTINS: &[&str] = &[
    "print", "len", "range", "str", "int", "float", "list", "dict", "set", "tuple", "type",
    "isinstance", "hasattr", "getattr", "setattr", "open", "super", "enumerate", "zip", "map",
    "filter", "sorted", "reversed", "any", "all", "min", "max", "sum", "abs", "round", "format",
    "repr", "id", "hash", "callable", "dir", "vars", "globals", "locals", "input", "eval", "exec",
    "compile",
];

pub fn extract(file_path: &str, content: &str) -> crate::error::Result<ExtractResult> {
    let parser = CodeParser::new();
    let tree = parser.parse(content, Language::Python)?;
    let root = tree.root_node();

    let mut result = ExtractResult::default();
    let total_lines = content.lines().count() as u32;
    let file_id = result.push_node(file_node(file_path, total_lines, Language::Python));

    walk_module_body(root, content, file_path, &file_id, &mut result);
    Ok(result)
}

fn walk_module_body(node: TsNode, content: &str, file_path: &str, owner_id: &str, result: &mut ExtractResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "decorated_definition" => {
                let (decs, def) = split_decorated(child, content);
                dispatch_definition(def, content, file_path, owner_id, decs, result);
            }
            "class_definition" | "function_definition" => {
                dispatch_definition(child, content, file_path, owner_id, Vec::new(), result);
            }
            "import_statement" => extract_import(child, content, file_path, result),
            "import_from_statement" => extract_import_from(child, content, file_path, result),
            "expression_statement" => {
                extract_module_constant(child, content, file_path, owner_id, result);
            }
            _ => {}
        }
    }
}

fn split_decorated<'a>(node: TsNode<'a>, content: &str) -> (Vec<String>, TsNode<'a>) {
    let mut decorators = Vec::new();
    let mut def = node;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            // decorator text is `@name(...)`; the attached name is the
            // trailing identifier in the decorator expression.
            let text = node_text(child, content).trim_start_matches('@').trim().to_string();
            decorators.push(decorator_name(&text));
        } else if child.kind() == "class_definition" || child.kind() == "function_definition" {
            def = child;
        }
    }
    (decorators, def)
}

fn decorator_name(text: &str) -> String {
    let base = text.split('(').next().unwrap_or(text);
    base.rsplit('.').next().unwrap_or(base).trim().to_string()
}

fn dispatch_definition(
    node: TsNode,
    content: &str,
    file_path: &str,
    owner_id: &str,
    decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    match node.kind() {
        "class_definition" => extract_class(node, content, file_path, owner_id, decorators, result),
        "function_definition" => extract_function(node, content, file_path, owner_id, None, decorators, result),
        _ => {}
    }
}

fn extract_import(node: TsNode, content: &str, file_path: &str, result: &mut ExtractResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let module = node_text(child, content).to_string();
                push_module_import(&module, None, file_path, result);
            }
            "aliased_import" => {
                let module = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, content).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, content).to_string());
                push_module_import(&module, alias, file_path, result);
            }
            _ => {}
        }
    }
}

fn push_module_import(module: &str, alias: Option<String>, file_path: &str, result: &mut ExtractResult) {
    let mut node = Node::new(NodeKind::Import, module, file_path, 1, 1, Language::Python)
        .with_metadata("type", serde_json::json!("module"));
    if let Some(alias) = alias {
        node = node.with_metadata("alias", serde_json::json!(alias));
    }
    result.push_node(node);
}

fn extract_import_from(node: TsNode, content: &str, file_path: &str, result: &mut ExtractResult) {
    let module_field = node.child_by_field_name("module_name");
    let is_relative = module_field
        .map(|n| n.kind() == "relative_import" || node_text(n, content).starts_with('.'))
        .unwrap_or(false)
        || node_text(node, content).trim_start().starts_with("from .");

    let module = module_field
        .map(|n| node_text(n, content).to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let mut named_imports = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "wildcard_import" => {
                named_imports.push(serde_json::json!({ "name": "*", "alias": null }));
            }
            "dotted_name" | "identifier" => {
                // skip the module_name occurrence itself
                if Some(child) != module_field {
                    let name = node_text(child, content).to_string();
                    named_imports.push(serde_json::json!({ "name": name, "alias": null }));
                }
            }
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, content).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, content).to_string());
                named_imports.push(serde_json::json!({ "name": name, "alias": alias }));
            }
            _ => {}
        }
    }

    let import_node = Node::new(NodeKind::Import, &module, file_path, line_start(node), line_end(node), Language::Python)
        .with_metadata("type", serde_json::json!("from"))
        .with_metadata("namedImports", serde_json::json!(named_imports))
        .with_metadata("isRelative", serde_json::json!(is_relative));
    result.push_node(import_node);
}

fn extract_class(
    node: TsNode,
    content: &str,
    file_path: &str,
    owner_id: &str,
    decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let docstring = extract_docstring(node, content);
    let mut bases = Vec::new();
    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            bases.push(node_text(arg, content).to_string());
        }
    }
    let is_abstract = decorators.iter().any(|d| d == "abstractmethod")
        || bases.iter().any(|b| b.contains("ABC") || b.contains("Protocol"));

    let class_node = Node::new(NodeKind::Class, &name, file_path, line_start(node), line_end(node), Language::Python)
        .with_metadata("bases", serde_json::json!(bases))
        .with_metadata("decorators", serde_json::json!(decorators))
        .with_metadata("isAbstract", serde_json::json!(is_abstract))
        .with_metadata("docstring", serde_json::json!(docstring));
    let class_id = result.push_node(class_node);
    result.push_edge(contains_edge(owner_id, &class_id));

    for base in &bases {
        if base == "object" {
            continue;
        }
        let base_name = strip_generics(base).to_string();
        let target = make_ref(RefCategory::Class, &base_name);
        result.push_edge(
            Edge::new(class_id.clone(), target, EdgeKind::Extends)
                .with_metadata("unresolved", serde_json::json!(true))
                .with_metadata("targetName", serde_json::json!(base_name)),
        );
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "decorated_definition" => {
                    let (decs, def) = split_decorated(member, content);
                    if def.kind() == "function_definition" {
                        extract_function(def, content, file_path, &class_id, Some(&name), decs, result);
                    }
                }
                "function_definition" => {
                    extract_function(member, content, file_path, &class_id, Some(&name), Vec::new(), result);
                }
                "expression_statement" => {
                    extract_module_constant(member, content, file_path, &class_id, result);
                }
                _ => {}
            }
        }
    }
}

fn extract_docstring(node: TsNode, content: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() == "expression_statement" {
        let expr = first.named_child(0)?;
        if expr.kind() == "string" {
            return Some(node_text(expr, content).to_string());
        }
    }
    None
}

fn extract_function(
    node: TsNode,
    content: &str,
    file_path: &str,
    owner_id: &str,
    class_name: Option<&str>,
    decorators: Vec<String>,
    result: &mut ExtractResult,
) {
    let raw_name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let is_async = modifier_present_before(node, content, "async");
    let is_static = decorators.iter().any(|d| d == "staticmethod");
    let is_classmethod = decorators.iter().any(|d| d == "classmethod");
    let is_property = decorators.iter().any(|d| d == "property");
    let is_private = raw_name.starts_with('_') && !raw_name.starts_with("__");
    let is_dunder = raw_name.starts_with("__") && raw_name.ends_with("__");
    let is_abstract = decorators.iter().any(|d| d == "abstractmethod");
    let docstring = extract_docstring(node, content);

    let parameters = extract_parameters(node, content, class_name.is_some() && !is_static);
    let return_type = node
        .child_by_field_name("return_type")
        .map(|n| node_text(n, content).to_string());

    let (kind, name) = match class_name {
        Some(owner) => (NodeKind::Method, Node::owner_qualified(owner, &raw_name)),
        None => (NodeKind::Function, raw_name.clone()),
    };

    let mut func_node = Node::new(kind, name, file_path, line_start(node), line_end(node), Language::Python)
        .with_metadata("isAsync", serde_json::json!(is_async))
        .with_metadata("parameters", serde_json::json!(parameters))
        .with_metadata("decorators", serde_json::json!(decorators))
        .with_metadata("isStatic", serde_json::json!(is_static))
        .with_metadata("isClassMethod", serde_json::json!(is_classmethod))
        .with_metadata("isProperty", serde_json::json!(is_property))
        .with_metadata("isPrivate", serde_json::json!(is_private))
        .with_metadata("isDunder", serde_json::json!(is_dunder))
        .with_metadata("isAbstract", serde_json::json!(is_abstract))
        .with_metadata("docstring", serde_json::json!(docstring));
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

fn modifier_present_before(node: TsNode, content: &str, keyword: &str) -> bool {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if !s.is_named() && node_text(s, content) == keyword {
            return true;
        }
        if s.is_named() {
            break;
        }
        sibling = s.prev_sibling();
    }
    false
}

fn extract_parameters(node: TsNode, content: &str, skip_first: bool) -> Vec<serde_json::Value> {
    let mut params = Vec::new();
    let Some(param_list) = node.child_by_field_name("parameters") else { return params };
    let mut cursor = param_list.walk();
    let mut index = 0usize;
    for param in param_list.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => {
                let name = node_text(param, content).to_string();
                if index == 0 && skip_first && (name == "self" || name == "cls") {
                    index += 1;
                    continue;
                }
                params.push(serde_json::json!({ "name": name, "type": null, "default": null }));
            }
            "typed_parameter" => {
                let name_node = param.named_child(0);
                let name = name_node.map(|n| node_text(n, content).to_string()).unwrap_or_default();
                let type_node = param.child_by_field_name("type");
                let type_str = type_node.map(|n| node_text(n, content).to_string());
                if index == 0 && skip_first && (name == "self" || name == "cls") {
                    index += 1;
                    continue;
                }
                params.push(serde_json::json!({ "name": name, "type": type_str, "default": null }));
            }
            "default_parameter" | "typed_default_parameter" => {
                let name_node = param.child_by_field_name("name");
                let name = name_node.map(|n| node_text(n, content).to_string()).unwrap_or_default();
                let type_node = param.child_by_field_name("type");
                let type_str = type_node.map(|n| node_text(n, content).to_string());
                let default_node = param.child_by_field_name("value");
                let default_str = default_node.map(|n| node_text(n, content).to_string());
                params.push(serde_json::json!({ "name": name, "type": type_str, "default": default_str }));
            }
            "list_splat_pattern" => {
                let inner = param.named_child(0).map(|n| node_text(n, content).to_string()).unwrap_or_default();
                params.push(serde_json::json!({ "name": format!("*{inner}"), "type": null, "default": null }));
            }
            "dictionary_splat_pattern" => {
                let inner = param.named_child(0).map(|n| node_text(n, content).to_string()).unwrap_or_default();
                params.push(serde_json::json!({ "name": format!("**{inner}"), "type": null, "default": null }));
            }
            _ => {}
        }
        index += 1;
    }
    params
}

/// `^[A-Z][A-Z0-9_]*$` module-level assignments become `variable` nodes
/// (constants), per §4.2.2.
fn extract_module_constant(node: TsNode, content: &str, file_path: &str, owner_id: &str, result: &mut ExtractResult) {
    let Some(assignment) = node.named_child(0) else { return };
    if assignment.kind() != "assignment" {
        return;
    }
    let Some(left) = assignment.child_by_field_name("left") else { return };
    if left.kind() != "identifier" {
        return;
    }
    let name = node_text(left, content);
    if !is_constant_name(name) {
        return;
    }
    let type_annotation = assignment
        .child_by_field_name("type")
        .map(|n| node_text(n, content).to_string());

    let mut const_node = Node::new(
        NodeKind::Variable,
        name,
        file_path,
        line_start(node),
        line_end(node),
        Language::Python,
    );
    if let Some(t) = &type_annotation {
        const_node = const_node.with_metadata("type", serde_json::json!(t));
    }
    let const_id = result.push_node(const_node);
    result.push_edge(contains_edge(owner_id, &const_id));
}

fn is_constant_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn collect_calls(node: TsNode, content: &str, owner_id: &str, dedup: &mut CallDedup, result: &mut ExtractResult) {
    if node.kind() == "call" {
        if let Some(callee) = node.child_by_field_name("function") {
            let call_name = node_text(callee, content).to_string();
            let bare = call_name.rsplit('.').next().unwrap_or(&call_name);
            if !BUILTINS.contains(&bare) && dedup.first_time(&call_name) {
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
        if matches!(child.kind(), "function_definition" | "class_definition" | "decorated_definition") {
            continue;
        }
        collect_calls(child, content, owner_id, dedup, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_with_base_and_method() {
        let src = "class Dog(Animal):\n    def bark(self):\n        self.log()\n";
        let result = extract("a.py", src).unwrap();
        let class = result.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "Dog");
        let extends = result.edges.iter().find(|e| e.kind == EdgeKind::Extends).unwrap();
        assert_eq!(extends.target_id, "ref:class:Animal");
        let method = result.nodes.iter().find(|n| n.kind == NodeKind::Method).unwrap();
        assert_eq!(method.name, "Dog.bark");
    }

    #[test]
    fn object_base_is_not_an_extends_edge() {
        let src = "class Foo(object):\n    pass\n";
        let result = extract("a.py", src).unwrap();
        assert!(result.edges.iter().all(|e| e.kind != EdgeKind::Extends));
    }

    #[test]
    fn builtins_are_skipped_from_calls() {
        let src = "def f():\n    print('x')\n    len([1])\n";
        let result = extract("a.py", src).unwrap();
        assert!(result.edges.iter().all(|e| e.kind != EdgeKind::Calls));
    }

    #[test]
    fn self_is_filtered_from_parameters() {
        let src = "class Foo:\n    def bar(self, x):\n        pass\n";
        let result = extract("a.py", src).unwrap();
        let method = result.nodes.iter().find(|n| n.kind == NodeKind::Method).unwrap();
        let params = method.metadata.get("parameters").unwrap().as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], "x");
    }

    #[test]
    fn module_constant_is_variable_node() {
        let src = "MAX_SIZE = 10\nnot_constant = 5\n";
        let result = extract("a.py", src).unwrap();
        let constants: Vec<_> = result.nodes.iter().filter(|n| n.kind == NodeKind::Variable).collect();
        assert_eq!(constants.len(), 1);
        assert_eq!(constants[0].name, "MAX_SIZE");
    }

    #[test]
    fn wildcard_from_import_is_one_node() {
        let src = "from pkg.mod import *\n";
        let result = extract("a.py", src).unwrap();
        let imports: Vec<_> = result.nodes.iter().filter(|n| n.kind == NodeKind::Import).collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].name, "pkg.mod");
    }
}
