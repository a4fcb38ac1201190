//! Scope Stack
//!
//! Lexically nested binding frames. Each template instantiation and each
//! external inclusion pushes one frame with [`ScopeStack::enter`]; the returned
//! [`ScopeGuard`] pops exactly that frame when dropped, including on early
//! return through `?`.
//!
//! Lookups walk frames innermost to outermost by index, so an inner binding
//! shadows an outer one only for as long as the inner frame lives.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{PreprocessError, Result};
use crate::node::Node;

/// Binding namespaces are isolated: a name bound as a parameter is not
/// visible as a template binding and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Parameter,
    TemplateBinding,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Parameter => write!(f, "Parameter"),
            Namespace::TemplateBinding => write!(f, "TemplateBinding"),
        }
    }
}

type Frame = HashMap<(Namespace, String), Node>;

#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// A stack holding a single, outermost frame
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a fresh frame. It is popped when the guard is dropped.
    pub fn enter(&mut self) -> ScopeGuard<'_> {
        self.frames.push(Frame::new());
        let depth = self.frames.len();
        ScopeGuard { stack: self, depth }
    }

    /// Bind into the topmost frame only
    pub fn insert(&mut self, name: impl Into<String>, value: Node, namespace: Namespace) {
        if let Some(top) = self.frames.last_mut() {
            top.insert((namespace, name.into()), value);
        }
    }

    /// Innermost binding for `name` in `namespace`
    pub fn get(&self, name: &str, namespace: Namespace) -> Result<&Node> {
        let key = (namespace, name.to_string());
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&key))
            .ok_or_else(|| PreprocessError::NameResolution {
                name: name.to_string(),
                namespace,
            })
    }

    pub fn contains(&self, name: &str, namespace: Namespace) -> bool {
        self.get(name, namespace).is_ok()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition of one frame. Derefs to the stack so nested
/// expansions can `enter()` again through it.
pub struct ScopeGuard<'a> {
    stack: &'a mut ScopeStack,
    depth: usize,
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &ScopeStack {
        &*self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeStack {
        &mut *self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        // Nested guards have already dropped, so this frame is the top.
        self.stack.frames.truncate(self.depth - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(key: &str, value: &str) -> Node {
        let mut m = crate::node::Mapping::new();
        m.insert(key, Node::string(value));
        Node::Mapping(m)
    }

    #[test]
    fn test_scoped_context() {
        let mut context = ScopeStack::new();
        let mut outer_scope = context.enter();
        let outer = mapping("outerKey", "outerVal");
        outer_scope.insert("outerName", outer.clone(), Namespace::Parameter);

        {
            let mut inner_scope = outer_scope.enter();
            let inner = mapping("innerKey1", "innerVal1");
            inner_scope.insert("innerName1", inner.clone(), Namespace::Parameter);

            assert_eq!(
                inner_scope.get("outerName", Namespace::Parameter).unwrap(),
                &outer
            );
            assert_eq!(
                inner_scope.get("innerName1", Namespace::Parameter).unwrap(),
                &inner
            );
        }

        {
            let mut inner_scope = outer_scope.enter();
            let inner = mapping("innerKey2", "innerVal2");
            inner_scope.insert("innerName2", inner.clone(), Namespace::Parameter);

            assert_eq!(
                inner_scope.get("outerName", Namespace::Parameter).unwrap(),
                &outer
            );
            assert_eq!(
                inner_scope.get("innerName2", Namespace::Parameter).unwrap(),
                &inner
            );
            // The sibling frame is gone
            assert!(matches!(
                inner_scope.get("innerName1", Namespace::Parameter),
                Err(PreprocessError::NameResolution { .. })
            ));
        }

        assert_eq!(
            outer_scope.get("outerName", Namespace::Parameter).unwrap(),
            &outer
        );
        assert!(matches!(
            outer_scope.get("outerName", Namespace::TemplateBinding),
            Err(PreprocessError::NameResolution {
                namespace: Namespace::TemplateBinding,
                ..
            })
        ));
    }

    #[test]
    fn test_shadowing_restores_outer_binding() {
        let mut stack = ScopeStack::new();
        stack.insert("Repeat", Node::string("outer"), Namespace::Parameter);
        {
            let mut inner = stack.enter();
            inner.insert("Repeat", Node::int(2), Namespace::Parameter);
            assert_eq!(inner.get("Repeat", Namespace::Parameter).unwrap(), &Node::int(2));
        }
        assert_eq!(
            stack.get("Repeat", Namespace::Parameter).unwrap(),
            &Node::string("outer")
        );
    }

    #[test]
    fn test_guard_pops_on_error_path() {
        fn fails(stack: &mut ScopeStack) -> Result<()> {
            let mut scope = stack.enter();
            scope.insert("Temp", Node::null(), Namespace::Parameter);
            scope.get("Missing", Namespace::Parameter)?;
            Ok(())
        }

        let mut stack = ScopeStack::new();
        assert!(fails(&mut stack).is_err());
        assert_eq!(stack.depth(), 1);
        assert!(!stack.contains("Temp", Namespace::Parameter));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let mut stack = ScopeStack::new();
        stack.insert("Shared", Node::int(1), Namespace::Parameter);
        stack.insert("Shared", Node::int(2), Namespace::TemplateBinding);

        assert_eq!(stack.get("Shared", Namespace::Parameter).unwrap(), &Node::int(1));
        assert_eq!(
            stack.get("Shared", Namespace::TemplateBinding).unwrap(),
            &Node::int(2)
        );
    }
}
