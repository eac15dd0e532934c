//! Print the dependency structure of a stack.
//!
//! # Output Formats
//!
//! ## Tree (default)
//! One tree per resource nothing depends on, children are dependencies:
//! ```text
//! └── policy
//!     └── bucket
//!         └── key
//! ```
//!
//! ## Levels
//! ```text
//! 0: key
//! 1: bucket
//! 2: policy
//! ```
//!
//! ## Order
//! One logical id per line, dependencies first.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::CliConfig;
use super::common::{context_overrides, load_context, load_stack};
use crate::resolver::DependencyGraph;

/// How to print the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// Dependency trees from every top-level resource
    #[default]
    Tree,
    /// Resolution levels
    Levels,
    /// Topological order
    Order,
}

/// Command to print the dependency graph.
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Stack definition file; the built-in blueprint when omitted
    #[arg(short, long, value_name = "FILE")]
    stack: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = GraphFormat::Tree)]
    format: GraphFormat,
}

impl GraphCommand {
    /// Execute the graph command.
    pub fn execute(self, config: &CliConfig, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        let overrides = context_overrides(&[], None, None);
        let (_, context) = load_context(config.config_path.as_deref(), &overrides, env)?;
        let stack = load_stack(self.stack.as_deref(), context)?;

        stack.validate()?;
        let graph = DependencyGraph::build(&stack)?;
        print!("{}", render(&graph, self.format)?);
        Ok(())
    }
}

/// Render `graph` as text in `format`.
pub fn render(graph: &DependencyGraph, format: GraphFormat) -> Result<String> {
    let text = match format {
        GraphFormat::Tree => graph.roots().iter().map(|root| graph.to_tree_string(root)).collect(),
        GraphFormat::Levels => graph
            .levels()?
            .iter()
            .enumerate()
            .map(|(depth, level)| format!("{depth}: {}\n", level.join(", ")))
            .collect(),
        GraphFormat::Order => {
            graph.topological_order()?.iter().map(|id| format!("{id}\n")).collect()
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("policy", "bucket");
        graph.add_dependency("bucket", "key");
        graph
    }

    #[test]
    fn test_render_levels() {
        assert_eq!(
            render(&chain(), GraphFormat::Levels).unwrap(),
            "0: key\n1: bucket\n2: policy\n"
        );
    }

    #[test]
    fn test_render_order() {
        assert_eq!(render(&chain(), GraphFormat::Order).unwrap(), "key\nbucket\npolicy\n");
    }

    #[test]
    fn test_render_tree_from_roots() {
        let tree = render(&chain(), GraphFormat::Tree).unwrap();
        assert!(tree.starts_with("└── policy\n"));
        assert!(tree.contains("key"));
    }
}
