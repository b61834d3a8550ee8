//! Radix tree node.
//!
//! Each node owns one path segment. Children are split by kind so matching
//! can try static segments, then the parameter child, then the wildcard.

use courier_core::RouteAttributes;

use crate::error::RouteError;
use crate::method_router::MethodRouter;

/// Kind of path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `node`.
    Static,
    /// Named capture such as `{id}`.
    Param(String),
    /// Catch-all such as `*path`, capturing the rest of the path.
    Wildcard(String),
}

impl SegmentKind {
    fn parse(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Self::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            Self::Wildcard(name.to_string())
        } else {
            Self::Static
        }
    }
}

/// A node in the routing tree.
#[derive(Debug, Clone)]
pub struct Node {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter>,
    static_children: Vec<Node>,
    param_child: Option<Box<Node>>,
    wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn new(segment: &str, kind: SegmentKind) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Returns the segment text of this node.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the segment kind of this node.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Inserts a pattern. The tree is left untouched when the pattern is
    /// invalid.
    pub fn insert(&mut self, pattern: &str, methods: MethodRouter) -> Result<(), RouteError> {
        let segments = Self::parse_pattern(pattern)?;
        self.check_conflicts(pattern, &segments)?;
        self.insert_segments(&segments, methods);
        Ok(())
    }

    fn parse_pattern(pattern: &str) -> Result<Vec<(&str, SegmentKind)>, RouteError> {
        let segments: Vec<(&str, SegmentKind)> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| (s, SegmentKind::parse(s)))
            .collect();

        for (index, (_, kind)) in segments.iter().enumerate() {
            match kind {
                SegmentKind::Param(name) | SegmentKind::Wildcard(name) if name.is_empty() => {
                    return Err(RouteError::UnnamedCapture {
                        pattern: pattern.to_string(),
                    });
                }
                SegmentKind::Wildcard(_) if index + 1 != segments.len() => {
                    return Err(RouteError::WildcardNotLast {
                        pattern: pattern.to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(segments)
    }

    fn check_conflicts(&self, pattern: &str, segments: &[(&str, SegmentKind)]) -> Result<(), RouteError> {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            return Ok(());
        };
        let child = match kind {
            SegmentKind::Static => self.find_static_child(segment),
            SegmentKind::Param(_) => self.param_child.as_deref(),
            SegmentKind::Wildcard(_) => self.wildcard_child.as_deref(),
        };
        let Some(child) = child else {
            return Ok(());
        };
        match (&child.kind, kind) {
            (SegmentKind::Param(existing), SegmentKind::Param(new))
            | (SegmentKind::Wildcard(existing), SegmentKind::Wildcard(new))
                if existing != new =>
            {
                Err(RouteError::ConflictingParameter {
                    pattern: pattern.to_string(),
                    existing: existing.clone(),
                    new: new.clone(),
                })
            }
            _ => child.check_conflicts(pattern, rest),
        }
    }

    fn insert_segments(&mut self, segments: &[(&str, SegmentKind)], methods: MethodRouter) {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        let child = match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new(segment, SegmentKind::Static));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            SegmentKind::Param(_) => &mut **self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(segment, kind.clone()))),
            SegmentKind::Wildcard(_) => &mut **self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new(segment, kind.clone()))),
        };
        child.insert_segments(rest, methods);
    }

    /// Matches a concrete path, capturing parameters into `attributes`.
    pub fn match_path<'a>(
        &'a self,
        path: &str,
        attributes: &mut RouteAttributes,
    ) -> Option<&'a MethodRouter> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.match_segments(&segments, attributes)
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        attributes: &mut RouteAttributes,
    ) -> Option<&'a MethodRouter> {
        let Some((segment, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(rest, attributes) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = attributes.len();
                attributes.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(rest, attributes) {
                    return Some(found);
                }
                attributes.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(methods)) = (&child.kind, &child.methods) {
                attributes.push(name.clone(), segments.join("/"));
                return Some(methods);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
