//! Read-only queries over a parsed [`Script`].
//!
//! All of these take `&Script` and never fail: the parser guarantees the
//! graph is closed, so every edge followed here points at an existing node.

use crate::parser::set_target;
use crate::types::{Line, Script, ScriptStats, START_NODE};
use crate::vars::placeholders;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use winnow::prelude::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Jump,
    Option,
}

/// A directed flow edge between two nodes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// One edge per jump and one per targeted choice option, in node order.
/// Within a node the jump comes first, then options in line order.
pub fn flow_edges(script: &Script) -> Vec<FlowEdge> {
    let mut edges = Vec::new();
    for node in script.nodes() {
        if let Some(target) = &node.jump {
            edges.push(FlowEdge {
                from: node.id.clone(),
                to: target.clone(),
                kind: EdgeKind::Jump,
            });
        }
        for line in &node.lines {
            if let Line::Choice { options, .. } = line {
                for target in options.iter().filter_map(|o| o.target.as_ref()) {
                    edges.push(FlowEdge {
                        from: node.id.clone(),
                        to: target.clone(),
                        kind: EdgeKind::Option,
                    });
                }
            }
        }
    }
    edges
}

/// Distinct successors of `id`, in edge order.
fn successors<'s>(script: &'s Script, id: &str) -> Vec<&'s str> {
    let Some(node) = script.node(id) else {
        return Vec::new();
    };
    let mut out: Vec<&str> = Vec::new();
    let jump = node.jump.as_deref();
    let options = node.lines.iter().flat_map(|line| match line {
        Line::Choice { options, .. } => options
            .iter()
            .filter_map(|o| o.target.as_deref())
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    });
    for target in jump.into_iter().chain(options) {
        if !out.contains(&target) {
            out.push(target);
        }
    }
    out
}

/// Every simple path from `start` to `target`.
///
/// A node already on the current path is not entered again, but it is
/// released on backtrack so other branches may pass through it.
pub fn find_paths(script: &Script, target: &str) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    if !script.contains(START_NODE) || !script.contains(target) {
        return paths;
    }
    if target == START_NODE {
        paths.push(vec![START_NODE.to_string()]);
        return paths;
    }

    let mut on_path = HashSet::from([START_NODE]);
    let mut stack = vec![Frame::new(script, START_NODE)];
    while let Some(frame) = stack.last_mut() {
        let Some(&next) = frame.next.get(frame.at) else {
            on_path.remove(frame.id);
            stack.pop();
            continue;
        };
        frame.at += 1;
        if on_path.contains(next) {
            continue;
        }
        if next == target {
            let path = stack.iter().map(|f| f.id).chain(std::iter::once(next));
            paths.push(path.map(str::to_string).collect());
            continue;
        }
        on_path.insert(next);
        stack.push(Frame::new(script, next));
    }
    paths
}

/// A node on the current path and the index of its next unexplored successor.
struct Frame<'s> {
    id: &'s str,
    next: Vec<&'s str>,
    at: usize,
}

impl<'s> Frame<'s> {
    fn new(script: &'s Script, id: &'s str) -> Self {
        Self {
            id,
            next: successors(script, id),
            at: 0,
        }
    }
}

/// Every node reachable from `start`. A node is visited at most once.
fn reachable(script: &Script) -> HashSet<&str> {
    let mut visited = HashSet::new();
    if !script.contains(START_NODE) {
        return visited;
    }
    let mut pending = vec![START_NODE];
    while let Some(id) = pending.pop() {
        if visited.insert(id) {
            pending.extend(
                successors(script, id)
                    .into_iter()
                    .filter(|next| !visited.contains(next)),
            );
        }
    }
    visited
}

pub fn is_node_reachable(script: &Script, target: &str) -> bool {
    reachable(script).contains(target)
}

/// Nodes other than `start` with no path from `start`, in declaration order.
pub fn find_unreachable_nodes(script: &Script) -> Vec<String> {
    let seen = reachable(script);
    script
        .node_ids()
        .filter(|id| *id != START_NODE && !seen.contains(id))
        .map(str::to_string)
        .collect()
}

/// Sorted, de-duplicated variable names used by the script: `{name}`
/// placeholders in any text and `set name` commands.
pub fn extract_variables(script: &Script) -> Vec<String> {
    let mut names = BTreeSet::new();
    let mut scan = |text: &str| {
        names.extend(placeholders(text).into_iter().map(|(_, name)| name.to_string()));
    };

    let mut assigned = Vec::new();
    for node in script.nodes() {
        for line in &node.lines {
            match line {
                Line::Dialogue {
                    speaker, content, ..
                } => {
                    if let Some(speaker) = speaker {
                        scan(speaker.as_str());
                    }
                    scan(content.as_str());
                }
                Line::Command { content, .. } => {
                    scan(content.as_str());
                    for mut segment in content.split(';') {
                        if let Ok(name) = set_target.parse_next(&mut segment) {
                            assigned.push(name.to_string());
                        }
                    }
                }
                Line::Choice {
                    content, options, ..
                } => {
                    scan(content.as_str());
                    for option in options {
                        scan(option.text.as_str());
                    }
                }
                Line::Input { content, .. } => scan(content.as_str()),
            }
        }
    }

    names.extend(assigned);
    names.into_iter().collect()
}

pub fn get_script_stats(script: &Script) -> ScriptStats {
    let mut stats = ScriptStats {
        node_count: script.len(),
        ..ScriptStats::default()
    };
    for line in script.nodes().iter().flat_map(|n| &n.lines) {
        match line {
            Line::Dialogue { .. } => stats.dialogue_count += 1,
            Line::Command { .. } => stats.command_count += 1,
            Line::Choice { .. } => stats.choice_count += 1,
            Line::Input { .. } => stats.input_count += 1,
        }
    }
    stats.variable_count = extract_variables(script).len();
    stats.branch_count = flow_edges(script).len();
    stats
}
