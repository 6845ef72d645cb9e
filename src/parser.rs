//! Archi `.archimate` XML parser.
//!
//! Parsing runs in three passes:
//!
//! 1. **Read**: a quick-xml event loop builds a generic `RawNode` tree.
//!    Malformed XML (unbalanced tags, bad attributes) fails here.
//! 2. **Type**: the raw tree is converted into typed `Node`s (folder,
//!    element, relationship, diagram). Missing required attributes fail
//!    here. This is the only validation boundary: nothing after it sees
//!    optional or unchecked data.
//! 3. **Build**: a recursive walk over the typed tree fills a [`Model`],
//!    assigning each element the layer of the folder it was found in.
//!
//! Folder layer mapping follows [`Layer::from_folder_type`]: unknown folder
//! types fall back to the business layer. Nested folders without a `type`
//! attribute inherit their parent's layer. A folder typed `relations`
//! yields relationships (recursively), one typed `diagrams` yields views.

use std::path::Path;

use ainstein_core::models::{Element, Layer, Model, Relationship, View};
use ainstein_core::taxonomy::normalize_type;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Failure to parse a single model file. Recoverable at the loader level.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("root element <{0}> is not an ArchiMate model")]
    MissingModelRoot(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
}

/// Parse the file at `path` into a [`Model`].
pub fn parse_file(path: &Path) -> Result<Model, ParseError> {
    let xml = std::fs::read_to_string(path)?;
    parse_str(&xml, path)
}

/// Parse `.archimate` XML text. `source_path` is recorded on the model.
pub fn parse_str(xml: &str, source_path: &Path) -> Result<Model, ParseError> {
    let xml = xml.trim_start_matches('\u{feff}');
    let raw = read_tree(xml)?;
    let root = ModelNode::from_raw(&raw)?;
    Ok(build_model(root, source_path))
}

// ============ Pass 1: generic tree ============

/// An XML element with its attributes, children and text content.
#[derive(Debug, Default)]
struct RawNode {
    /// Qualified name as written, e.g. `archimate:model`.
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<RawNode>,
    text: String,
}

impl RawNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Malformed(e.to_string()))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required_attr(&self, key: &'static str) -> Result<String, ParseError> {
        self.attr(key)
            .map(str::to_string)
            .ok_or_else(|| ParseError::MissingAttribute {
                element: self.name.clone(),
                attribute: key,
            })
    }

    /// `xsi:type` of an element node, or a plain `type` as a fallback.
    fn xsi_type(&self) -> Option<&str> {
        self.attr("xsi:type").or_else(|| self.attr("type"))
    }

    fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a RawNode> + 'a {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// Text of a `<documentation>` child, or a `documentation` attribute.
    fn documentation(&self) -> Option<String> {
        self.children_named("documentation")
            .map(|d| d.text.trim().to_string())
            .find(|t| !t.is_empty())
            .or_else(|| self.attr("documentation").map(str::to_string))
    }
}

fn attach(stack: &mut [RawNode], root: &mut Option<RawNode>, node: RawNode) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(ParseError::Malformed(
                "more than one root element".to_string(),
            ))
        }
    }
    Ok(())
}

fn read_tree(xml: &str) -> Result<RawNode, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<RawNode> = Vec::new();
    let mut root: Option<RawNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(RawNode::from_start(&e)?),
            Event::Empty(e) => {
                let node = RawNode::from_start(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| ParseError::Malformed(e.to_string()))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ParseError::Malformed("document has no root element".to_string()))
}

// ============ Pass 2: typed tree ============

#[derive(Debug)]
struct ModelNode {
    id: String,
    name: String,
    version: Option<String>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Folder {
        folder_type: Option<String>,
        children: Vec<Node>,
    },
    Element(ElementNode),
    Relationship(RelationshipNode),
    Diagram(DiagramNode),
}

#[derive(Debug)]
struct ElementNode {
    id: String,
    name: String,
    element_type: String,
    documentation: Option<String>,
    properties: Vec<(String, String)>,
}

#[derive(Debug)]
struct RelationshipNode {
    id: String,
    relationship_type: String,
    source: String,
    target: String,
    name: Option<String>,
    documentation: Option<String>,
}

#[derive(Debug)]
struct DiagramNode {
    id: String,
    name: String,
    documentation: Option<String>,
    element_refs: Vec<String>,
    relationship_refs: Vec<String>,
}

impl ModelNode {
    fn from_raw(raw: &RawNode) -> Result<Self, ParseError> {
        if raw.local_name() != "model" {
            return Err(ParseError::MissingModelRoot(raw.name.clone()));
        }
        let children = convert_children(raw, false)?;
        Ok(Self {
            id: raw.attr("id").unwrap_or_default().to_string(),
            name: raw.attr("name").unwrap_or_default().to_string(),
            version: raw.attr("version").map(str::to_string),
            children,
        })
    }
}

fn convert_children(raw: &RawNode, in_relations: bool) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();
    for child in &raw.children {
        match child.local_name() {
            "folder" => {
                let folder_type = child.attr("type").map(str::to_string);
                let relations = match folder_type.as_deref() {
                    Some(t) => t.eq_ignore_ascii_case("relations"),
                    None => in_relations,
                };
                nodes.push(Node::Folder {
                    children: convert_children(child, relations)?,
                    folder_type,
                });
            }
            "element" => nodes.push(convert_item(child, in_relations)?),
            _ => {}
        }
    }
    Ok(nodes)
}

fn is_relationship_type(normalized: &str) -> bool {
    normalized.ends_with("relationship")
}

fn is_diagram_type(normalized: &str) -> bool {
    normalized.ends_with("diagrammodel") || normalized == "sketchmodel"
}

fn convert_item(raw: &RawNode, in_relations: bool) -> Result<Node, ParseError> {
    let raw_type = raw.xsi_type().unwrap_or_default().to_string();
    let normalized = normalize_type(&raw_type);
    let id = raw.required_attr("id")?;
    let name = raw.attr("name").map(str::to_string);
    let documentation = raw.documentation();

    if is_diagram_type(&normalized) {
        let mut diagram = DiagramNode {
            id,
            name: name.unwrap_or_default(),
            documentation,
            element_refs: Vec::new(),
            relationship_refs: Vec::new(),
        };
        collect_diagram_refs(raw, &mut diagram);
        return Ok(Node::Diagram(diagram));
    }

    if in_relations || is_relationship_type(&normalized) {
        return Ok(Node::Relationship(RelationshipNode {
            id,
            relationship_type: raw_type,
            source: raw.required_attr("source")?,
            target: raw.required_attr("target")?,
            name: name.filter(|n| !n.trim().is_empty()),
            documentation,
        }));
    }

    let properties = raw
        .children_named("property")
        .filter_map(|p| {
            p.attr("key")
                .map(|k| (k.to_string(), p.attr("value").unwrap_or_default().to_string()))
        })
        .collect();

    Ok(Node::Element(ElementNode {
        id,
        name: name.unwrap_or_default(),
        element_type: raw_type,
        documentation,
        properties,
    }))
}

/// Collect model references of diagram objects and connections, depth first.
fn collect_diagram_refs(raw: &RawNode, diagram: &mut DiagramNode) {
    for child in &raw.children {
        if let Some(id) = child.attr("archimateElement") {
            if !diagram.element_refs.iter().any(|r| r == id) {
                diagram.element_refs.push(id.to_string());
            }
        }
        if let Some(id) = child.attr("archimateRelationship") {
            if !diagram.relationship_refs.iter().any(|r| r == id) {
                diagram.relationship_refs.push(id.to_string());
            }
        }
        collect_diagram_refs(child, diagram);
    }
}

// ============ Pass 3: model ============

fn build_model(root: ModelNode, source_path: &Path) -> Model {
    let mut model = Model::new(root.id, root.name, root.version, source_path);
    if model.name.is_empty() {
        model.name = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    for node in root.children {
        walk(&mut model, node, Layer::Business);
    }
    model
}

fn walk(model: &mut Model, node: Node, layer: Layer) {
    match node {
        Node::Folder {
            folder_type,
            children,
        } => {
            let layer = folder_type
                .as_deref()
                .map(Layer::from_folder_type)
                .unwrap_or(layer);
            for child in children {
                walk(model, child, layer);
            }
        }
        Node::Element(e) => {
            let element = Element {
                id: e.id,
                name: e.name,
                element_type: e.element_type,
                layer,
                documentation: e.documentation,
                properties: e.properties,
                model: model.name.clone(),
            };
            model.add_element(element);
        }
        Node::Relationship(r) => model.add_relationship(Relationship {
            id: r.id,
            relationship_type: r.relationship_type,
            source: r.source,
            target: r.target,
            name: r.name,
            documentation: r.documentation,
        }),
        Node::Diagram(d) => model.add_view(View {
            id: d.id,
            name: d.name,
            documentation: d.documentation,
            element_refs: d.element_refs,
            relationship_refs: d.relationship_refs,
        }),
    }
}
