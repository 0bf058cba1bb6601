//! Java/Spring-aware extractor (§4.2.3): package/import nodes, Spring
//! stereotype upgrades (`@RestController`/`@Controller`/`@Service`/
//! `@Repository`/`@Component`), mapping-annotation upgrades to `endpoint`,
//! and `@Autowired`/`@Inject` wiring edges.

use tree_sitter::Node as TsNode;

use crate::indexer::common::{
    contains_edge, file_node, line_end, line_start, node_text, strip_generics, CallDedup,
    ExtractResult,
};
use crate::indexer::parser::CodeParser;
use crate::types::{make_ref, Edge, EdgeKind, Language, Node, NodeKind, RefCategory};

const HTTP_MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

struct Annotation {
    name: String,
    args: Vec<(Option<String>, String)>,
}

pub fn extract(file_path: &str, content: &str) -> crate::error::Result<ExtractResult> {
    let parser = CodeParser::new();
    let tree = parser.parse(content, Language::Java)?;
    let root = tree.root_node();

    let mut result = ExtractResult::default();
    let total_lines = content.lines().count() as u32;
    let file_id = result.push_node(file_node(file_path, total_lines, Language::Java));

    let mut cursor = root.walk();
    let mut pending_annotations: Vec<Annotation> = Vec::new();
    let mut package_name = String::new();

    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                if let Some(name_node) = child.named_child(0) {
                    package_name = node_text(name_node, content).to_string();
                    let module_node = Node::new(
                        NodeKind::Module,
                        &package_name,
                        file_path,
                        line_start(child),
                        line_end(child),
                        Language::Java,
                    );
                    let module_id = result.push_node(module_node);
                    result.push_edge(contains_edge(&file_id, &module_id));
                }
            }
            "import_declaration" => extract_import(child, content, file_path, &mut result),
            "marker_annotation" | "annotation" => {
                pending_annotations.push(parse_annotation(child, content));
                continue;
            }
            "class_declaration" | "interface_declaration" => {
                extract_type(
                    child,
                    content,
                    file_path,
                    &file_id,
                    std::mem::take(&mut pending_annotations),
                    &mut result,
                );
            }
            _ => {}
        }
        pending_annotations.clear();
    }

    Ok(result)
}

fn extract_import(node: TsNode, content: &str, file_path: &str, result: &mut ExtractResult) {
    let Some(name_node) = node.named_child(0) else { return };
    let import_path = node_text(name_node, content).to_string();
    let is_static = node
        .children(&mut node.walk())
        .any(|c| !c.is_named() && node_text(c, content) == "static");

    let import_node = Node::new(
        NodeKind::Import,
        &import_path,
        file_path,
        line_start(node),
        line_end(node),
        Language::Java,
    )
    .with_metadata("isStatic", serde_json::json!(is_static));
    result.push_node(import_node);
}

fn parse_annotation(node: TsNode, content: &str) -> Annotation {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();
    let mut args = Vec::new();
    if let Some(arg_list) = node.child_by_field_name("arguments") {
        let mut cursor = arg_list.walk();
        for arg in arg_list.named_children(&mut cursor) {
            match arg.kind() {
                "element_value_pair" => {
                    let key = arg
                        .child_by_field_name("key")
                        .map(|n| node_text(n, content).to_string());
                    let value = arg
                        .child_by_field_name("value")
                        .map(|n| unquote(node_text(n, content)))
                        .unwrap_or_default();
                    args.push((key, value));
                }
                _ => {
                    args.push((None, unquote(node_text(arg, content))));
                }
            }
        }
    }
    Annotation { name, args }
}

fn unquote(text: &str) -> String {
    text.trim_matches('"').to_string()
}

fn annotation_first_value(annotation: &Annotation) -> Option<String> {
    annotation
        .args
        .iter()
        .find(|(k, _)| matches!(k.as_deref(), Some("value") | Some("path") | None))
        .map(|(_, v)| v.clone())
}

/// `{name, args}` for one annotation, `args` keyed by attribute name when
/// every argument is an `element_value_pair`, else a positional array (§4.2.3
/// "full annotation list with extracted values").
fn annotation_to_json(annotation: &Annotation) -> serde_json::Value {
    let args = if annotation.args.is_empty() {
        serde_json::json!({})
    } else if annotation.args.iter().all(|(k, _)| k.is_some()) {
        let map: serde_json::Map<String, serde_json::Value> = annotation
            .args
            .iter()
            .map(|(k, v)| (k.clone().unwrap_or_default(), serde_json::json!(v)))
            .collect();
        serde_json::Value::Object(map)
    } else {
        serde_json::json!(annotation.args.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>())
    };
    serde_json::json!({ "name": annotation.name, "args": args })
}

/// All modifier keywords (`public`, `abstract`, `final`, `static`, ...)
/// attached to a declaration node, whether they precede it as anonymous
/// siblings or sit in an explicit `modifiers` node (mirrors
/// [`modifier_present`]'s traversal, but collects every keyword instead of
/// checking for one).
fn collect_modifiers(node: TsNode, content: &str) -> Vec<String> {
    let mut mods = Vec::new();
    let mut push = |mods: &mut Vec<String>, text: String| {
        if !mods.contains(&text) {
            mods.push(text);
        }
    };

    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if !s.is_named() {
            push(&mut mods, node_text(s, content).to_string());
        }
        if s.kind() == "modifiers" {
            let mut mcursor = s.walk();
            for c in s.children(&mut mcursor) {
                if !c.is_named() {
                    push(&mut mods, node_text(c, content).to_string());
                }
            }
        }
        sibling = s.prev_sibling();
    }
    let mut cursor = node.walk();
    for c in node.children(&mut cursor) {
        if c.kind() == "modifiers" {
            let mut mc = c.walk();
            for m in c.children(&mut mc) {
                if !m.is_named() {
                    push(&mut mods, node_text(m, content).to_string());
                }
            }
        }
    }
    mods
}

fn stereotype_kind(annotations: &[Annotation]) -> Option<NodeKind> {
    for a in annotations {
        match a.name.as_str() {
            "RestController" | "Controller" => return Some(NodeKind::Controller),
            "Service" => return Some(NodeKind::Service),
            "Repository" => return Some(NodeKind::Repository),
            "Component" => return Some(NodeKind::Component),
            _ => {}
        }
    }
    None
}

fn class_level_path(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .find(|a| a.name == "RequestMapping")
        .and_then(annotation_first_value)
        .unwrap_or_default()
}

fn extract_type(
    node: TsNode,
    content: &str,
    file_path: &str,
    owner_id: &str,
    annotations: Vec<Annotation>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let kind = stereotype_kind(&annotations).unwrap_or(if node.kind() == "interface_declaration" {
        NodeKind::Interface
    } else {
        NodeKind::Class
    });
    let class_path = class_level_path(&annotations);
    let is_spring_bean = stereotype_kind(&annotations).is_some();
    let annotations_json: Vec<serde_json::Value> = annotations.iter().map(annotation_to_json).collect();
    let modifiers = collect_modifiers(node, content);
    let is_abstract = modifiers.iter().any(|m| m == "abstract");
    let is_final = modifiers.iter().any(|m| m == "final");

    let mut type_node = Node::new(kind, &name, file_path, line_start(node), line_end(node), Language::Java)
        .with_metadata("annotations", serde_json::json!(annotations_json))
        .with_metadata("modifiers", serde_json::json!(modifiers))
        .with_metadata("isAbstract", serde_json::json!(is_abstract))
        .with_metadata("isFinal", serde_json::json!(is_final))
        .with_metadata("isSpringBean", serde_json::json!(is_spring_bean));
    if !class_path.is_empty() {
        type_node = type_node.with_metadata("basePath", serde_json::json!(class_path));
    }
    let type_id = result.push_node(type_node);
    result.push_edge(contains_edge(owner_id, &type_id));

    if let Some(superclass) = node.child_by_field_name("superclass") {
        if let Some(type_node) = superclass.named_child(0) {
            let base = strip_generics(node_text(type_node, content)).to_string();
            let target = make_ref(RefCategory::Class, &base);
            result.push_edge(
                Edge::new(type_id.clone(), target, EdgeKind::Extends)
                    .with_metadata("unresolved", serde_json::json!(true))
                    .with_metadata("targetName", serde_json::json!(base)),
            );
        }
    }

    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        let mut cursor = interfaces.walk();
        for iface in interfaces.named_children(&mut cursor) {
            let mut icursor = iface.walk();
            for target_node in iface.named_children(&mut icursor) {
                let iface_name = strip_generics(node_text(target_node, content)).to_string();
                let target = make_ref(RefCategory::Interface, &iface_name);
                let edge_kind = if node.kind() == "interface_declaration" {
                    EdgeKind::Extends
                } else {
                    EdgeKind::Implements
                };
                result.push_edge(
                    Edge::new(type_id.clone(), target, edge_kind)
                        .with_metadata("unresolved", serde_json::json!(true))
                        .with_metadata("targetName", serde_json::json!(iface_name)),
                );
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        let mut pending: Vec<Annotation> = Vec::new();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "marker_annotation" | "annotation" => {
                    pending.push(parse_annotation(member, content));
                    continue;
                }
                "method_declaration" => {
                    extract_method(
                        member,
                        content,
                        file_path,
                        &name,
                        &type_id,
                        &class_path,
                        std::mem::take(&mut pending),
                        result,
                    );
                }
                "constructor_declaration" => {
                    extract_constructor(member, content, &type_id, result);
                }
                "field_declaration" => {
                    extract_field(
                        member,
                        content,
                        file_path,
                        &name,
                        &type_id,
                        std::mem::take(&mut pending),
                        result,
                    );
                }
                _ => {}
            }
            pending.clear();
        }
    }
}

fn extract_method(
    node: TsNode,
    content: &str,
    file_path: &str,
    class_name: &str,
    class_id: &str,
    class_path: &str,
    annotations: Vec<Annotation>,
    result: &mut ExtractResult,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let mapping = HTTP_MAPPINGS
        .iter()
        .find_map(|(ann, verb)| annotations.iter().find(|a| &a.name == ann).map(|a| (*verb, a)));
    let request_mapping = annotations.iter().find(|a| a.name == "RequestMapping");

    let (http_method, path) = if let Some((verb, ann)) = mapping {
        (Some(verb.to_string()), annotation_first_value(ann).unwrap_or_default())
    } else if let Some(ann) = request_mapping {
        // `method = RequestMethod.POST` stores the raw expression text; the
        // verb is the trailing segment after `RequestMethod.` (§4.2.3).
        let method = ann
            .args
            .iter()
            .find(|(k, _)| k.as_deref() == Some("method"))
            .map(|(_, v)| v.rsplit('.').next().unwrap_or(v).to_string());
        (method, annotation_first_value(ann).unwrap_or_default())
    } else {
        (None, String::new())
    };

    let is_endpoint = http_method.is_some() || request_mapping.is_some();
    let parameters = extract_parameters(node, content);
    let return_type = node
        .child_by_field_name("type")
        .map(|n| node_text(n, content).to_string());
    let visibility = ["public", "private", "protected"]
        .into_iter()
        .find(|kw| modifier_present(node, content, kw))
        .unwrap_or("package")
        .to_string();
    let is_static = modifier_present(node, content, "static");
    let decorator_names: Vec<String> = annotations.iter().map(|a| a.name.clone()).collect();

    let kind = if is_endpoint { NodeKind::Endpoint } else { NodeKind::Method };
    let qualified = Node::owner_qualified(class_name, &name);
    let mut method_node = Node::new(kind, qualified, file_path, line_start(node), line_end(node), Language::Java)
        .with_metadata("visibility", serde_json::json!(visibility))
        .with_metadata("isStatic", serde_json::json!(is_static))
        .with_metadata("annotations", serde_json::json!(decorator_names))
        .with_metadata("parameters", serde_json::json!(parameters));
    if let Some(rt) = &return_type {
        method_node = method_node.with_metadata("returnType", serde_json::json!(rt));
    }
    if is_endpoint {
        let full_path = join_path(class_path, &path);
        method_node = method_node
            .with_metadata("httpMethod", serde_json::json!(http_method.unwrap_or_else(|| "GET".to_string())))
            .with_metadata("path", serde_json::json!(path))
            .with_metadata("fullPath", serde_json::json!(full_path));
    }
    let method_id = result.push_node(method_node);
    result.push_edge(contains_edge(class_id, &method_id));
    extract_param_autowires(node, content, class_id, result);

    if let Some(body) = node.child_by_field_name("body") {
        let mut dedup = CallDedup::new();
        collect_calls(body, content, &method_id, &mut dedup, result);
    }
}

/// For each `@Autowired`/`@Inject` parameter of a (typically setter) method,
/// emit an `autowires` edge from the owning class (§4.2.3: "For each
/// parameter annotated `@Autowired`/`@Inject`, emit `autowires` ->
/// `ref:class:<paramType>`"), matching the source (class, not member) used
/// for field-level autowiring and constructor injection below.
fn extract_param_autowires(node: TsNode, content: &str, class_id: &str, result: &mut ExtractResult) {
    let Some(param_list) = node.child_by_field_name("parameters") else { return };
    let mut cursor = param_list.walk();
    for param in param_list.named_children(&mut cursor) {
        if param.kind() != "formal_parameter" {
            continue;
        }
        let annotated = parameter_annotation_names(param, content)
            .iter()
            .any(|n| n == "Autowired" || n == "Inject");
        if !annotated {
            continue;
        }
        let Some(type_node) = param.child_by_field_name("type") else { continue };
        let type_name = strip_generics(node_text(type_node, content)).to_string();
        let target = make_ref(RefCategory::Class, &type_name);
        result.push_edge(
            Edge::new(class_id, target, EdgeKind::Autowires)
                .with_metadata("unresolved", serde_json::json!(true))
                .with_metadata("targetName", serde_json::json!(type_name))
                .with_metadata("viaParameter", serde_json::json!(true)),
        );
    }
}

/// Annotation names attached directly to a `formal_parameter`, whether they
/// appear as the parameter's own children or nested in a `modifiers` node.
fn parameter_annotation_names(param: TsNode, content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut collect = |n: TsNode, names: &mut Vec<String>| {
        if let Some(name_node) = n.child_by_field_name("name") {
            names.push(node_text(name_node, content).to_string());
        }
    };
    let mut cursor = param.walk();
    for child in param.children(&mut cursor) {
        match child.kind() {
            "marker_annotation" | "annotation" => collect(child, &mut names),
            "modifiers" => {
                let mut mcursor = child.walk();
                for m in child.children(&mut mcursor) {
                    if matches!(m.kind(), "marker_annotation" | "annotation") {
                        collect(m, &mut names);
                    }
                }
            }
            _ => {}
        }
    }
    names
}

fn extract_parameters(node: TsNode, content: &str) -> Vec<serde_json::Value> {
    let mut params = Vec::new();
    if let Some(param_list) = node.child_by_field_name("parameters") {
        let mut cursor = param_list.walk();
        for param in param_list.named_children(&mut cursor) {
            if param.kind() != "formal_parameter" {
                continue;
            }
            let name = param
                .child_by_field_name("name")
                .map(|n| node_text(n, content).to_string())
                .unwrap_or_default();
            let ptype = param
                .child_by_field_name("type")
                .map(|n| node_text(n, content).to_string());
            params.push(serde_json::json!({ "name": name, "type": ptype }));
        }
    }
    params
}

fn extract_constructor(node: TsNode, content: &str, class_id: &str, result: &mut ExtractResult) {
    let Some(param_list) = node.child_by_field_name("parameters") else { return };
    let mut cursor = param_list.walk();
    for param in param_list.named_children(&mut cursor) {
        if param.kind() != "formal_parameter" {
            continue;
        }
        let Some(type_node) = param.child_by_field_name("type") else { continue };
        let type_name = strip_generics(node_text(type_node, content)).to_string();
        let target = make_ref(RefCategory::Class, &type_name);
        result.push_edge(
            Edge::new(class_id, target, EdgeKind::Injects)
                .with_metadata("unresolved", serde_json::json!(true))
                .with_metadata("targetName", serde_json::json!(type_name))
                .with_metadata("viaConstructor", serde_json::json!(true)),
        );
    }
}

fn extract_field(
    node: TsNode,
    content: &str,
    file_path: &str,
    class_name: &str,
    class_id: &str,
    annotations: Vec<Annotation>,
    result: &mut ExtractResult,
) {
    let is_autowired = annotations.iter().any(|a| a.name == "Autowired" || a.name == "Inject");
    let field_type = node
        .child_by_field_name("type")
        .map(|n| node_text(n, content).to_string());

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let name = declarator
            .child_by_field_name("name")
            .map(|n| node_text(n, content).to_string())
            .unwrap_or_default();
        let qualified = Node::owner_qualified(class_name, &name);
        let mut field_node = Node::new(
            NodeKind::Variable,
            qualified,
            file_path,
            line_start(node),
            line_end(node),
            Language::Java,
        )
        .with_metadata("isAutowired", serde_json::json!(is_autowired));
        if let Some(t) = &field_type {
            field_node = field_node.with_metadata("type", serde_json::json!(t));
        }
        let field_id = result.push_node(field_node);
        result.push_edge(contains_edge(class_id, &field_id));

        if is_autowired {
            if let Some(t) = &field_type {
                let type_name = strip_generics(t).to_string();
                let target = make_ref(RefCategory::Class, &type_name);
                result.push_edge(
                    Edge::new(class_id, target, EdgeKind::Autowires)
                        .with_metadata("unresolved", serde_json::json!(true))
                        .with_metadata("targetName", serde_json::json!(type_name)),
                );
            }
        }
    }
}

fn modifier_present(node: TsNode, content: &str, keyword: &str) -> bool {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if !s.is_named() && node_text(s, content) == keyword {
            return true;
        }
        if s.kind() == "modifiers" {
            let mut mcursor = s.walk();
            if s.children(&mut mcursor).any(|c| node_text(c, content) == keyword) {
                return true;
            }
        }
        sibling = s.prev_sibling();
    }
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| {
        c.kind() == "modifiers" && {
            let mut mc = c.walk();
            c.children(&mut mc).any(|m| node_text(m, content) == keyword)
        }
    })
}

fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{path}"),
    }
}

fn collect_calls(node: TsNode, content: &str, owner_id: &str, dedup: &mut CallDedup, result: &mut ExtractResult) {
    if node.kind() == "method_invocation" {
        let call_name = node
            .child_by_field_name("name")
            .map(|n| {
                let method = node_text(n, content);
                match node.child_by_field_name("object") {
                    Some(obj) => format!("{}.{}", node_text(obj, content), method),
                    None => method.to_string(),
                }
            })
            .unwrap_or_default();
        if !call_name.is_empty() && dedup.first_time(&call_name) {
            let target = make_ref(RefCategory::Method, &call_name);
            result.push_edge(
                Edge::new(owner_id, target, EdgeKind::Calls)
                    .with_metadata("unresolved", serde_json::json!(true))
                    .with_metadata("targetName", serde_json::json!(call_name))
                    .with_metadata("line", serde_json::json!(line_start(node))),
            );
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "class_declaration" | "interface_declaration" | "method_declaration" | "constructor_declaration"
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
    fn rest_controller_class_becomes_controller_node() {
        let src = r#"
package com.example.api;

@RestController
@RequestMapping("/users")
public class UserController {
    @GetMapping("/{id}")
    public User getUser(Long id) {
        return service.find(id);
    }
}
"#;
        let result = extract("UserController.java", src).unwrap();
        let controller = result.nodes.iter().find(|n| n.kind == NodeKind::Controller).unwrap();
        assert_eq!(controller.name, "UserController");

        let endpoint = result.nodes.iter().find(|n| n.kind == NodeKind::Endpoint).unwrap();
        assert_eq!(endpoint.metadata.get("httpMethod").unwrap(), &serde_json::json!("GET"));
        assert_eq!(endpoint.metadata.get("fullPath").unwrap(), &serde_json::json!("/users/{id}"));
    }

    #[test]
    fn plain_class_without_stereotype_stays_class() {
        let src = "public class Plain {}";
        let result = extract("Plain.java", src).unwrap();
        assert!(result.nodes.iter().any(|n| n.kind == NodeKind::Class && n.name == "Plain"));
        assert!(result.nodes.iter().all(|n| n.kind != NodeKind::Controller));
    }

    #[test]
    fn autowired_field_emits_autowires_edge() {
        let src = r#"
@Service
public class OrderService {
    @Autowired
    private PaymentClient paymentClient;
}
"#;
        let result = extract("OrderService.java", src).unwrap();
        let autowires: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Autowires).collect();
        assert_eq!(autowires.len(), 1);
        assert_eq!(autowires[0].target_id, "ref:class:PaymentClient");
    }

    #[test]
    fn constructor_injection_emits_injects_edges() {
        let src = r#"
@Service
public class OrderService {
    public OrderService(PaymentClient client, InventoryClient inv) {
    }
}
"#;
        let result = extract("OrderService.java", src).unwrap();
        let injects: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Injects).collect();
        assert_eq!(injects.len(), 2);
    }

    #[test]
    fn implements_on_class_is_implements_edge() {
        let src = "public class Impl implements Shape {}";
        let result = extract("Impl.java", src).unwrap();
        let edge = result.edges.iter().find(|e| e.kind == EdgeKind::Implements).unwrap();
        assert_eq!(edge.target_id, "ref:interface:Shape");
    }

    #[test]
    fn autowired_setter_parameter_emits_autowires_edge() {
        let src = r#"
@Service
public class OrderService {
    public void setPaymentClient(@Autowired PaymentClient client) {
    }
}
"#;
        let result = extract("OrderService.java", src).unwrap();
        let autowires: Vec<_> = result.edges.iter().filter(|e| e.kind == EdgeKind::Autowires).collect();
        assert_eq!(autowires.len(), 1);
        assert_eq!(autowires[0].target_id, "ref:class:PaymentClient");
        assert_eq!(autowires[0].metadata.get("viaParameter").unwrap(), &serde_json::json!(true));
    }

    #[test]
    fn request_mapping_method_attribute_strips_enum_prefix() {
        let src = r#"
@RestController
public class WidgetController {
    @RequestMapping(value = "/widgets", method = RequestMethod.POST)
    public void create() {
    }
}
"#;
        let result = extract("WidgetController.java", src).unwrap();
        let endpoint = result.nodes.iter().find(|n| n.kind == NodeKind::Endpoint).unwrap();
        assert_eq!(endpoint.metadata.get("httpMethod").unwrap(), &serde_json::json!("POST"));
    }

    #[test]
    fn class_metadata_records_annotation_args_and_modifiers() {
        let src = r#"
@RestController
@RequestMapping(value = "/api", produces = "application/json")
public abstract class BaseController {
}
"#;
        let result = extract("BaseController.java", src).unwrap();
        let class = result.nodes.iter().find(|n| n.name == "BaseController").unwrap();

        assert_eq!(class.metadata.get("isAbstract").unwrap(), &serde_json::json!(true));
        assert_eq!(class.metadata.get("isFinal").unwrap(), &serde_json::json!(false));
        let modifiers: Vec<String> = class
            .metadata
            .get("modifiers")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert!(modifiers.contains(&"public".to_string()));
        assert!(modifiers.contains(&"abstract".to_string()));

        let annotations = class.metadata.get("annotations").unwrap().as_array().unwrap();
        let request_mapping = annotations
            .iter()
            .find(|a| a.get("name").unwrap() == "RequestMapping")
            .unwrap();
        assert_eq!(
            request_mapping.get("args").unwrap().get("value").unwrap(),
            &serde_json::json!("/api")
        );
        assert_eq!(
            request_mapping.get("args").unwrap().get("produces").unwrap(),
            &serde_json::json!("application/json")
        );
    }
}
