use crate::graph::GraphStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Node totals followed by one row per edge kind present in the graph
pub fn edge_table(stats: &GraphStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("nodes", &stats.total_nodes.to_string());
    builder.add_row("tokens", &stats.tokens.to_string());
    if stats.opaque_nodes > 0 {
        builder.add_row("opaque", &stats.opaque_nodes.to_string());
    }
    builder.add_row("edges", &stats.total_edges.to_string());
    for (kind, count) in &stats.edges_by_kind {
        builder.add_row(&format!("  {}", kind), &count.to_string());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_graph, ErrorPolicy, Language};

    #[test]
    fn test_empty_table() {
        assert_eq!(TableBuilder::new().build(), "");
    }

    #[test]
    fn test_edge_table_rows() {
        let graph = build_graph("a = 1\nb = a\n", Language::Python, ErrorPolicy::Raise).unwrap();
        let table = edge_table(&graph.stats());
        assert!(table.contains("Metric"));
        assert!(table.contains("last_write"));
        assert!(table.contains("next_control_flow"));
        assert!(!table.contains("opaque"));
    }
}
