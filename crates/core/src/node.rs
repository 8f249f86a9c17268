//! Assertion trees.
//!
//! Operators (`AND`/`OR`) and leaf assertions live in separate namespaces:
//! a leaf named `"AND"` is still a leaf when built with [`AssertionNode::assert`].
//!
//! The array form `[name, ...rest]` is kept for interop. In that form the
//! operator keywords take precedence, so `["AND", ...]` is always a combination.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeError;

pub const AND: &str = "AND";
pub const OR: &str = "OR";

/// Operator that combines child nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Every child must pass.
    And,
    /// At least one child must pass.
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => AND,
            Operator::Or => OR,
        }
    }

    pub fn from_keyword(name: &str) -> Option<Self> {
        match name {
            AND => Some(Operator::And),
            OR => Some(Operator::Or),
            _ => None,
        }
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the tree an activity produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum AssertionNode {
    /// Invoke the assertion registered under `name` with `args`.
    Assert { name: String, args: Vec<Value> },
    All(Vec<AssertionNode>),
    Any(Vec<AssertionNode>),
}

impl AssertionNode {
    pub fn assert<I>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Assert {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all(children: impl IntoIterator<Item = AssertionNode>) -> Self {
        Self::All(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = AssertionNode>) -> Self {
        Self::Any(children.into_iter().collect())
    }

    /// The operator at this node, or `None` for a leaf.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Assert { .. } => None,
            Self::All(_) => Some(Operator::And),
            Self::Any(_) => Some(Operator::Or),
        }
    }

    /// Operator keyword or leaf name (the first element of the array form).
    pub fn name(&self) -> &str {
        match self {
            Self::Assert { name, .. } => name,
            Self::All(_) => AND,
            Self::Any(_) => OR,
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Self::Assert { .. } => 1,
            Self::All(children) | Self::Any(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Assert { .. } => 1,
            Self::All(children) | Self::Any(children) => {
                children.iter().map(Self::leaf_count).sum()
            }
        }
    }

    /// Leaf names in visiting order (duplicates kept).
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaf_names(&mut out);
        out
    }

    fn collect_leaf_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Assert { name, .. } => out.push(name),
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.collect_leaf_names(out);
                }
            }
        }
    }
}

impl TryFrom<Value> for AssertionNode {
    type Error = NodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Array(items) = value else {
            return Err(NodeError::Empty);
        };
        let mut items = items.into_iter();
        let name = match items.next() {
            Some(Value::String(name)) => name,
            Some(other) => return Err(NodeError::InvalidName(other.to_string())),
            None => return Err(NodeError::Empty),
        };

        let Some(operator) = Operator::from_keyword(&name) else {
            return Ok(Self::Assert {
                name,
                args: items.collect(),
            });
        };

        let children = items
            .map(|child| {
                if !child.is_array() {
                    return Err(NodeError::InvalidChild {
                        operator: name.clone(),
                        found: child.to_string(),
                    });
                }
                AssertionNode::try_from(child)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match operator {
            Operator::And => Self::All(children),
            Operator::Or => Self::Any(children),
        })
    }
}

impl From<AssertionNode> for Value {
    fn from(node: AssertionNode) -> Self {
        match node {
            AssertionNode::Assert { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name));
                items.extend(args);
                Value::Array(items)
            }
            AssertionNode::All(children) => operator_value(AND, children),
            AssertionNode::Any(children) => operator_value(OR, children),
        }
    }
}

fn operator_value(keyword: &str, children: Vec<AssertionNode>) -> Value {
    let mut items = Vec::with_capacity(children.len() + 1);
    items.push(Value::String(keyword.to_string()));
    items.extend(children.into_iter().map(Value::from));
    Value::Array(items)
}
