//! Declarative field descriptors.
//!
//! Each node type lists its fields once, in the order configuration must be
//! applied. The same table serves population (matching path segments to
//! fields) and dispatch (deciding which callbacks fire, and in which order).

use crate::dispatch::{process_list, process_node};
use crate::error::{TreeError, ValueError};
use crate::list::KeyedList;
use crate::node::{ListEntry, Node, Scope};
use crate::path::PathSegment;
use crate::populate::put_node;

/// Parses a raw value into a leaf of `N`.
pub type SetFn<N> = fn(&mut N, &str) -> Result<(), ValueError>;

/// Processor callback attached to a field.
pub type Callback<N> = Box<
    dyn Fn(&N, &mut <N as Node>::Processor, &Scope) -> Result<(), <N as Node>::Error>
        + Send
        + Sync,
>;

type PutFn<N> = Box<dyn Fn(&mut N, &[PathSegment], &str) -> Result<(), TreeError> + Send + Sync>;

type RecurseFn<N> = Box<
    dyn Fn(&N, &mut <N as Node>::Processor, bool, &Scope) -> Result<(), <N as Node>::Error>
        + Send
        + Sync,
>;

enum FieldKind<N: Node> {
    /// List key, assigned when the entry is created.
    Key,
    /// Scalar leaf.
    Leaf(SetFn<N>),
    /// Nested container or keyed list.
    Nested { put: PutFn<N>, recurse: RecurseFn<N> },
    /// Callback-only step; consumes no path segment.
    Trigger,
}

/// One entry of a node's field table.
pub struct Field<N: Node> {
    name: &'static str,
    kind: FieldKind<N>,
    trigger: Vec<&'static str>,
    callback: Option<Callback<N>>,
}

impl<N: Node> Field<N> {
    fn new(name: &'static str, kind: FieldKind<N>) -> Self {
        Self {
            name,
            kind,
            trigger: vec![name],
            callback: None,
        }
    }

    /// Name matched against path segments and recorded in the touched set.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Names that must all be touched for this field to dispatch.
    #[must_use]
    pub fn trigger(&self) -> &[&'static str] {
        &self.trigger
    }

    pub(crate) fn accepts(&self, segment: &str) -> bool {
        !matches!(self.kind, FieldKind::Trigger) && self.name == segment
    }

    pub(crate) fn put(
        &self,
        node: &mut N,
        rest: &[PathSegment],
        value: &str,
    ) -> Result<(), TreeError> {
        match &self.kind {
            FieldKind::Key | FieldKind::Trigger => Ok(()),
            FieldKind::Leaf(set) => {
                set(node, value).map_err(|error| TreeError::parse(self.name, value, &error))
            }
            FieldKind::Nested { put, .. } => put(node, rest, value),
        }
    }

    /// Runs this field's step when its trigger is satisfied.
    ///
    /// A nested field runs its callback before recursing, or after the
    /// recursion when `reverse` is set.
    pub(crate) fn dispatch(
        &self,
        node: &N,
        processor: &mut N::Processor,
        reverse: bool,
        scope: &Scope,
    ) -> Result<(), N::Error> {
        if !node.get_changes(&self.trigger) {
            return Ok(());
        }
        let FieldKind::Nested { recurse, .. } = &self.kind else {
            return self.notify(node, processor, scope);
        };
        if reverse {
            recurse(node, processor, reverse, scope)?;
            self.notify(node, processor, scope)
        } else {
            self.notify(node, processor, scope)?;
            recurse(node, processor, reverse, scope)
        }
    }

    fn notify(&self, node: &N, processor: &mut N::Processor, scope: &Scope) -> Result<(), N::Error> {
        match &self.callback {
            Some(callback) => callback(node, processor, scope),
            None => Ok(()),
        }
    }
}

/// Builds a node's field table.
///
/// ```ignore
/// static FIELDS: Lazy<Vec<Field<Loopback>>> = Lazy::new(|| {
///     FieldsBuilder::new()
///         .key("id")
///         .node("config", |lo| &lo.config, |lo| &mut lo.config)
///         .notify(|lo, p, scope| p.loopback_config(scope, &lo.config))
///         .list("addresses", |lo| &lo.addresses, |lo| &mut lo.addresses)
///         .build()
/// });
/// ```
pub struct FieldsBuilder<N: Node> {
    fields: Vec<Field<N>>,
}

impl<N: Node> Default for FieldsBuilder<N> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<N: Node> FieldsBuilder<N> {
    /// Starts an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a list key. Writing it only marks it touched.
    #[must_use]
    pub fn key(mut self, name: &'static str) -> Self {
        self.fields.push(Field::new(name, FieldKind::Key));
        self
    }

    /// Declares a scalar leaf parsed by `set`.
    #[must_use]
    pub fn leaf(mut self, name: &'static str, set: SetFn<N>) -> Self {
        self.fields.push(Field::new(name, FieldKind::Leaf(set)));
        self
    }

    /// Declares a nested container reached through `get`/`get_mut`.
    #[must_use]
    pub fn node<C>(mut self, name: &'static str, get: fn(&N) -> &C, get_mut: fn(&mut N) -> &mut C) -> Self
    where
        C: Node<Processor = N::Processor, Error = N::Error>,
    {
        let put: PutFn<N> = Box::new(move |parent: &mut N, rest: &[PathSegment], value: &str| {
            put_node(get_mut(parent), rest, value)
        });
        let recurse: RecurseFn<N> = Box::new(
            move |parent: &N, processor: &mut N::Processor, reverse: bool, scope: &Scope| {
                process_node::<C>(processor, reverse, scope, get(parent))
            },
        );
        self.fields
            .push(Field::new(name, FieldKind::Nested { put, recurse }));
        self
    }

    /// Declares a keyed list held in a `name` container segment.
    ///
    /// The segment after the container addresses the entry; its attributes
    /// carry the key.
    #[must_use]
    pub fn list<C>(
        mut self,
        name: &'static str,
        get: fn(&N) -> &KeyedList<C>,
        get_mut: fn(&mut N) -> &mut KeyedList<C>,
    ) -> Self
    where
        C: ListEntry<Processor = N::Processor, Error = N::Error>,
    {
        let put: PutFn<N> = Box::new(move |parent: &mut N, rest: &[PathSegment], value: &str| {
            get_mut(parent).put(rest, value)
        });
        let recurse: RecurseFn<N> = Box::new(
            move |parent: &N, processor: &mut N::Processor, reverse: bool, scope: &Scope| {
                process_list::<C>(processor, reverse, scope, get(parent))
            },
        );
        self.fields
            .push(Field::new(name, FieldKind::Nested { put, recurse }));
        self
    }

    /// Declares a callback-only step that fires when every name in `names`
    /// was touched.
    #[must_use]
    pub fn trigger(mut self, names: &[&'static str]) -> Self {
        let mut field = Field::new("", FieldKind::Trigger);
        field.trigger = names.to_vec();
        self.fields.push(field);
        self
    }

    /// Attaches a callback to the most recently declared field.
    #[must_use]
    pub fn notify<F>(mut self, callback: F) -> Self
    where
        F: Fn(&N, &mut N::Processor, &Scope) -> Result<(), N::Error> + Send + Sync + 'static,
    {
        if let Some(field) = self.fields.last_mut() {
            field.callback = Some(Box::new(callback));
        }
        self
    }

    /// Replaces the trigger of the most recently declared field.
    #[must_use]
    pub fn when_all(mut self, names: &[&'static str]) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.trigger = names.to_vec();
        }
        self
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> Vec<Field<N>> {
        self.fields
    }
}
