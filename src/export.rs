//! Graph exporters
//!
//! DOT output puts every non-token node in the top-level graph and the
//! token chain in a `Tokens` cluster; every edge carries its kind as label.
//! JSON output is the serde form of nodes and edges.

use crate::edge::{Edge, EdgeKind};
use crate::graph::ProgramGraph;
use crate::node::Node;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

/// Output format of an exported graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Dot,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Dot => "dot",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "json" => Ok(ExportFormat::Json),
            _ => Err(Error::InvalidArgument(format!("Unknown export format: {}", s))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Edge colors for DOT output; kinds without an override use their default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeColors {
    overrides: BTreeMap<EdgeKind, String>,
}

impl EdgeColors {
    /// Parse `kind -> color` pairs as found in the config file
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut colors = Self::default();
        for (kind, color) in map {
            let kind = kind
                .parse::<EdgeKind>()
                .map_err(|e| Error::Config(format!("[export.colors] {}", e)))?;
            colors.set(kind, color);
        }
        Ok(colors)
    }

    pub fn set(&mut self, kind: EdgeKind, color: &str) {
        self.overrides.insert(kind, color.to_string());
    }

    pub fn get(&self, kind: EdgeKind) -> &str {
        self.overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.color())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

fn dot_node(node: &Node) -> String {
    format!(
        "node{}[shape=\"rectangle\", label=\"{}\"];",
        node.id,
        escape(node.label())
    )
}

fn dot_edge(edge: &Edge, colors: &EdgeColors) -> String {
    format!(
        "node{} -> node{} [label=\"{}\" color={}];",
        edge.source,
        edge.target,
        edge.label(),
        colors.get(edge.kind)
    )
}

/// Write the graph in DOT format
pub fn write_dot<W: Write>(graph: &ProgramGraph, out: &mut W, colors: &EdgeColors) -> Result<()> {
    writeln!(out, "digraph {{")?;
    writeln!(out, "\tcompound=true;")?;

    for node in graph.nodes().filter(|n| !n.is_token()) {
        writeln!(out, "\t{}", dot_node(node))?;
    }

    writeln!(out, "\tsubgraph clusterNextToken {{")?;
    writeln!(out, "\t\tlabel=\"Tokens\";")?;
    writeln!(out, "\t\trank=\"same\";")?;
    let mut chain = Vec::new();
    for token in graph.tokens() {
        writeln!(out, "\t\t{}", dot_node(token))?;
        chain.extend(
            graph
                .edges_from(token.id)
                .iter()
                .filter(|e| e.kind == EdgeKind::NextToken),
        );
    }
    for edge in chain {
        writeln!(out, "\t\t{}", dot_edge(edge, colors))?;
    }
    writeln!(out, "\t}}")?;

    for edge in graph.edges().filter(|e| e.kind != EdgeKind::NextToken) {
        writeln!(out, "\t{}", dot_edge(edge, colors))?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

#[derive(Serialize)]
struct JsonGraph<'a> {
    language: crate::adapter::Language,
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
}

/// Write nodes and edges as pretty-printed JSON
pub fn write_json<W: Write>(graph: &ProgramGraph, out: &mut W) -> Result<()> {
    let doc = JsonGraph {
        language: graph.language(),
        nodes: graph.nodes().collect(),
        edges: graph.edges().collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &doc)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    writeln!(out)?;
    Ok(())
}

/// Write in the given format
pub fn write_graph<W: Write>(
    graph: &ProgramGraph,
    out: &mut W,
    format: ExportFormat,
    colors: &EdgeColors,
) -> Result<()> {
    match format {
        ExportFormat::Dot => write_dot(graph, out, colors),
        ExportFormat::Json => write_json(graph, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Language;
    use crate::builder::{build_graph, ErrorPolicy};

    fn sample() -> ProgramGraph {
        build_graph("x = \"a\"\ny = x\n", Language::Python, ErrorPolicy::Raise).unwrap()
    }

    #[test]
    fn test_dot_layout() {
        let graph = sample();
        let mut out = Vec::new();
        write_dot(&graph, &mut out, &EdgeColors::default()).unwrap();
        let dot = String::from_utf8(out).unwrap();

        assert!(dot.starts_with("digraph {\n\tcompound=true;\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\tnode0[shape=\"rectangle\", label=\"module\"];"));
        assert!(dot.contains("subgraph clusterNextToken {\n\t\tlabel=\"Tokens\";"));
        // quotes inside token labels are escaped
        assert!(dot.contains("label=\"\\\"\"]"));
        assert!(dot.contains("[label=\"next_token\" color=gray];"));
        assert!(dot.contains("[label=\"computed_from\" color=darkgreen];"));
    }

    #[test]
    fn test_next_token_edges_inside_cluster() {
        let graph = sample();
        let mut out = Vec::new();
        write_dot(&graph, &mut out, &EdgeColors::default()).unwrap();
        let dot = String::from_utf8(out).unwrap();
        for line in dot.lines().filter(|l| l.contains("next_token")) {
            assert!(line.starts_with("\t\t"));
        }
        let edge_lines = dot.lines().filter(|l| l.contains(" -> ")).count();
        assert_eq!(edge_lines, graph.edge_count());
    }

    #[test]
    fn test_color_overrides() {
        let mut map = BTreeMap::new();
        map.insert("child".to_string(), "pink".to_string());
        let colors = EdgeColors::from_map(&map).unwrap();
        assert_eq!(colors.get(EdgeKind::Child), "pink");
        assert_eq!(colors.get(EdgeKind::LastWrite), EdgeKind::LastWrite.color());

        map.insert("nonsense".to_string(), "red".to_string());
        assert!(EdgeColors::from_map(&map).is_err());
    }

    #[test]
    fn test_json_export() {
        let graph = sample();
        let mut out = Vec::new();
        write_json(&graph, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["language"], "python");
        assert_eq!(value["nodes"].as_array().unwrap().len(), graph.len());
        assert_eq!(value["edges"].as_array().unwrap().len(), graph.edge_count());
        assert_eq!(value["nodes"][0]["kind"], "module");
    }

    #[test]
    fn test_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.dot");
        sample().to_dot_file(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("clusterNextToken"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::Dot.extension(), "dot");
        assert!("png".parse::<ExportFormat>().is_err());
    }
}
