//! Match / Switch combinator.
//!
//! Multi-way dispatch over a value or a signal. Cases come in three kinds:
//! strict equality (`case`), runtime type tag (`case_type_of`) and exact
//! runtime type (`case_instance_of`). Adjacent cases of the same kind share
//! one lookup table, so dispatch inside a run is a single hash lookup while
//! declaration order is kept across runs of different kinds.
//!
//! Over a plain value the terminal call evaluates immediately. Over a signal
//! it returns a new signal that re-evaluates the case table on every
//! emission of the source.

use std::any::TypeId;
use std::cell::Cell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use super::signal::{ReadSignal, Signal, SignalValue};
use super::subscriber::SubscribeMode;
use crate::value::Value;

/// Runtime type tags, named after JavaScript's `typeof` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Undefined,
    Boolean,
    Number,
    BigInt,
    String,
    Symbol,
    Function,
    Object,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::BigInt => "bigint",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Function => "function",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that can be dispatched on.
pub trait Matchable: Clone + Eq + Hash + 'static {
    /// The `typeof`-style tag of this value.
    fn type_tag(&self) -> TypeTag;

    /// The exact runtime type of this value, if it has one.
    ///
    /// Only the exact type is reported; there is no notion of a supertype
    /// matching a subtype's case.
    fn constructor(&self) -> Option<TypeId>;
}

macro_rules! impl_matchable {
    ($tag:expr => $($ty:ty),* $(,)?) => {
        $(
            impl Matchable for $ty {
                fn type_tag(&self) -> TypeTag {
                    $tag
                }

                fn constructor(&self) -> Option<TypeId> {
                    Some(TypeId::of::<$ty>())
                }
            }
        )*
    };
}

impl_matchable!(TypeTag::Number => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_matchable!(TypeTag::BigInt => i128, u128);
impl_matchable!(TypeTag::Boolean => bool);
impl_matchable!(TypeTag::String => char, String, &'static str);

impl Matchable for () {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Undefined
    }

    fn constructor(&self) -> Option<TypeId> {
        None
    }
}

/// `None` is `null`: tagged as an object, without a constructor.
impl<T: Matchable> Matchable for Option<T> {
    fn type_tag(&self) -> TypeTag {
        match self {
            Some(value) => value.type_tag(),
            None => TypeTag::Object,
        }
    }

    fn constructor(&self) -> Option<TypeId> {
        self.as_ref().and_then(Matchable::constructor)
    }
}

type Then<T, R> = Rc<dyn Fn(T) -> R>;

/// A run of adjacent cases of one kind.
enum CaseChunk<T, R> {
    Equal(IndexMap<T, Then<T, R>>),
    TypeOf(IndexMap<TypeTag, Then<T, R>>),
    InstanceOf(IndexMap<TypeId, Then<T, R>>),
}

/// Ordered case chunks.
struct CaseTable<T, R> {
    chunks: Vec<CaseChunk<T, R>>,
}

impl<T: Matchable, R> CaseTable<T, R> {
    fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    fn add_equal(&mut self, key: T, then: Then<T, R>) {
        if let Some(CaseChunk::Equal(map)) = self.chunks.last_mut() {
            map.insert(key, then);
        } else {
            self.chunks.push(CaseChunk::Equal(IndexMap::from([(key, then)])));
        }
    }

    fn add_type_of(&mut self, tag: TypeTag, then: Then<T, R>) {
        if let Some(CaseChunk::TypeOf(map)) = self.chunks.last_mut() {
            map.insert(tag, then);
        } else {
            self.chunks.push(CaseChunk::TypeOf(IndexMap::from([(tag, then)])));
        }
    }

    fn add_instance_of(&mut self, type_id: TypeId, then: Then<T, R>) {
        if let Some(CaseChunk::InstanceOf(map)) = self.chunks.last_mut() {
            map.insert(type_id, then);
        } else {
            self.chunks
                .push(CaseChunk::InstanceOf(IndexMap::from([(type_id, then)])));
        }
    }

    /// The first handler, in chunk order, that matches `value`.
    fn resolve(&self, value: &T) -> Option<Then<T, R>> {
        self.chunks.iter().find_map(|chunk| {
            let then = match chunk {
                CaseChunk::Equal(map) => map.get(value),
                CaseChunk::TypeOf(map) => map.get(&value.type_tag()),
                CaseChunk::InstanceOf(map) => value.constructor().and_then(|id| map.get(&id)),
            };
            then.cloned()
        })
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Value-mode match builder.
///
/// # Example
///
/// ```rust,ignore
/// let label = Match::new(3)
///     .case(1, |_| "one")
///     .case_type_of(TypeTag::Number, |_| "some number")
///     .default(|_| "other");
/// assert_eq!(label, "some number");
/// ```
pub struct Match<T, R> {
    value: T,
    cases: CaseTable<T, R>,
}

impl<T: Matchable, R: 'static> Match<T, R> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            cases: CaseTable::new(),
        }
    }

    /// Match by strict equality.
    pub fn case<F>(mut self, value: T, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_equal(value, Rc::new(then));
        self
    }

    /// Match by runtime type tag.
    pub fn case_type_of<F>(mut self, tag: TypeTag, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_type_of(tag, Rc::new(then));
        self
    }

    /// Match values whose exact runtime type is `C`.
    pub fn case_instance_of<C: 'static, F>(mut self, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_instance_of(TypeId::of::<C>(), Rc::new(then));
        self
    }

    /// Evaluate: the first matching handler's result, else `fallback`'s.
    pub fn default<F>(self, fallback: F) -> R
    where
        F: FnOnce(T) -> R,
    {
        match self.cases.resolve(&self.value) {
            Some(then) => then(self.value),
            None => fallback(self.value),
        }
    }

    /// Evaluate without a fallback; `None` when nothing matched.
    pub fn finish(self) -> Option<R> {
        self.cases.resolve(&self.value).map(|then| then(self.value))
    }
}

impl<T: fmt::Debug, R> fmt::Debug for Match<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("value", &self.value)
            .field("chunks", &self.cases.chunks.len())
            .finish()
    }
}

type Fallback<T, R> = Rc<dyn Fn(&ReadSignal<T>) -> R>;

/// Signal-mode match builder.
///
/// The terminal call returns a lazy signal. While it has subscribers it holds
/// exactly one immediate-mode subscription on the source.
pub struct MatchSignal<T, R> {
    source: ReadSignal<T>,
    cases: CaseTable<T, R>,
}

impl<T, R> MatchSignal<T, R>
where
    T: Matchable + SignalValue,
    R: SignalValue,
{
    pub fn new(source: ReadSignal<T>) -> Self {
        Self {
            source,
            cases: CaseTable::new(),
        }
    }

    /// Match by strict equality.
    pub fn case<F>(mut self, value: T, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_equal(value, Rc::new(then));
        self
    }

    /// Match by runtime type tag.
    pub fn case_type_of<F>(mut self, tag: TypeTag, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_type_of(tag, Rc::new(then));
        self
    }

    /// Match values whose exact runtime type is `C`.
    pub fn case_instance_of<C: 'static, F>(mut self, then: F) -> Self
    where
        F: Fn(T) -> R + 'static,
    {
        self.cases.add_instance_of(TypeId::of::<C>(), Rc::new(then));
        self
    }

    /// Finish with a fallback.
    ///
    /// The fallback receives the source signal itself. It runs when an
    /// emission falls through every case, but not again for consecutive
    /// fall-through emissions: the previous fallback result stays in place
    /// until a case matches in between.
    pub fn default<F>(self, fallback: F) -> ReadSignal<Option<R>>
    where
        F: Fn(&ReadSignal<T>) -> R + 'static,
    {
        self.build(Some(Rc::new(fallback)))
    }

    /// Finish without a fallback; unmatched emissions set `None`.
    pub fn finish(self) -> ReadSignal<Option<R>> {
        self.build(None)
    }

    fn build(self, fallback: Option<Fallback<T, R>>) -> ReadSignal<Option<R>> {
        let Self { source, cases } = self;
        let cases = Rc::new(cases);
        tracing::trace!(chunks = cases.len(), "building signal match");

        ReadSignal::lazy(None, move |setter| {
            let cases = Rc::clone(&cases);
            let fallback = fallback.clone();
            let raw = source.clone();
            let in_fallback = Cell::new(false);

            source.subscribe(
                move |value: &T| {
                    if let Some(then) = cases.resolve(value) {
                        in_fallback.set(false);
                        setter.set(Some(then(value.clone())));
                        return;
                    }
                    match &fallback {
                        Some(fallback) => {
                            if !in_fallback.get() {
                                setter.set(Some(fallback(&raw)));
                            }
                        }
                        None => setter.set(None),
                    }
                    in_fallback.set(true);
                },
                SubscribeMode::Immediate,
            )
        })
    }
}

/// Entry point shared by values and signals.
///
/// Signals produce a [`MatchSignal`]; plain values produce a [`Match`].
pub trait Switch: Sized {
    type Builder<R: 'static>;

    fn switch<R: 'static>(self) -> Self::Builder<R>;
}

impl<T: Matchable + SignalValue> Switch for ReadSignal<T> {
    type Builder<R: 'static> = MatchSignal<T, R>;

    fn switch<R: 'static>(self) -> Self::Builder<R> {
        MatchSignal {
            source: self,
            cases: CaseTable::new(),
        }
    }
}

impl<T: Matchable + SignalValue> Switch for Signal<T> {
    type Builder<R: 'static> = MatchSignal<T, R>;

    fn switch<R: 'static>(self) -> Self::Builder<R> {
        self.read_only().switch()
    }
}

macro_rules! impl_switch_for_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Switch for $ty {
                type Builder<R: 'static> = Match<$ty, R>;

                fn switch<R: 'static>(self) -> Self::Builder<R> {
                    Match::new(self)
                }
            }
        )*
    };
}

impl_switch_for_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    String,
    &'static str,
    Value,
);

impl<T: Matchable> Switch for Option<T> {
    type Builder<R: 'static> = Match<Option<T>, R>;

    fn switch<R: 'static>(self) -> Self::Builder<R> {
        Match::new(self)
    }
}

/// Start a match over a value or a signal.
pub fn create_match<S: Switch, R: 'static>(source: S) -> S::Builder<R> {
    source.switch()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Constructor marker for `Shape::Circle`.
    #[allow(dead_code)]
    struct Circle;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Shape {
        Circle,
        Square,
    }

    impl Matchable for Shape {
        fn type_tag(&self) -> TypeTag {
            TypeTag::Object
        }

        fn constructor(&self) -> Option<TypeId> {
            match self {
                Shape::Circle => Some(TypeId::of::<Circle>()),
                Shape::Square => None,
            }
        }
    }

    #[test]
    fn equality_case_matches() {
        let result = Match::new(2)
            .case(1, |_| "one")
            .case(2, |_| "two")
            .default(|_| "other");
        assert_eq!(result, "two");
    }

    #[test]
    fn earlier_chunk_wins_across_kinds() {
        let result = Match::new(1)
            .case(1, |_| "exact")
            .case_type_of(TypeTag::Number, |_| "number")
            .default(|_| "other");
        assert_eq!(result, "exact");

        let result = Match::new(1)
            .case_type_of(TypeTag::Number, |_| "number")
            .case(1, |_| "exact")
            .default(|_| "other");
        assert_eq!(result, "number");
    }

    #[test]
    fn instance_of_uses_exact_type() {
        let result = Match::new(Shape::Circle)
            .case_instance_of::<Circle, _>(|_| "circle")
            .default(|_| "unknown");
        assert_eq!(result, "circle");

        let result = Match::new(Shape::Square)
            .case_instance_of::<Circle, _>(|_| "circle")
            .default(|_| "unknown");
        assert_eq!(result, "unknown");
    }

    #[test]
    fn finish_without_fallback_is_none() {
        let result = Match::new("x").case("y", |_| 1).finish();
        assert_eq!(result, None);
    }

    #[test]
    fn fallback_receives_value() {
        let result = Match::new(9).case(1, |v| v).default(|v| v * 10);
        assert_eq!(result, 90);
    }

    #[test]
    fn create_match_dispatches_on_plain_values() {
        let result = create_match::<_, &'static str>(true)
            .case_type_of(TypeTag::Boolean, |_| "bool")
            .default(|_| "other");
        assert_eq!(result, "bool");
    }

    #[test]
    fn create_match_accepts_dynamic_values_and_options() {
        let result = create_match::<_, &'static str>(Value::from("hi"))
            .case(Value::from(1), |_| "one")
            .case_type_of(TypeTag::String, |_| "string")
            .default(|_| "other");
        assert_eq!(result, "string");

        let missing = create_match::<_, i32>(None::<i32>)
            .case(Some(1), |_| 1)
            .case_type_of(TypeTag::Object, |_| 0)
            .default(|_| -1);
        assert_eq!(missing, 0);

        let present = create_match::<_, i32>(Some(4)).case(Some(4), |v| v.unwrap_or(0) * 2).finish();
        assert_eq!(present, Some(8));
    }

    #[test]
    fn signal_match_re_evaluates_on_emission() {
        let source = Signal::new(1);
        let matched = create_match::<_, &'static str>(source.clone())
            .case(1, |_| "one")
            .case(2, |_| "two")
            .default(|_| "other");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subscription = matched.subscribe(
            move |value| sink.borrow_mut().push(*value),
            SubscribeMode::Immediate,
        );

        source.set(2);
        source.set(7);
        assert_eq!(*seen.borrow(), vec![Some("one"), Some("two"), Some("other")]);

        subscription.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn consecutive_fallthrough_invokes_fallback_once() {
        let source = Signal::new(0);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let matched = MatchSignal::new(source.read_only())
            .case(0, |_| String::from("zero"))
            .default(move |raw| {
                counter.set(counter.get() + 1);
                format!("fallback from {}", raw.get())
            });
        let _subscription = matched.subscribe(|_| {}, SubscribeMode::Normal);

        source.set(5);
        source.set(6);
        assert_eq!(calls.get(), 1);
        assert_eq!(matched.get().as_deref(), Some("fallback from 5"));

        source.set(0);
        source.set(8);
        assert_eq!(calls.get(), 2);
        assert_eq!(matched.get().as_deref(), Some("fallback from 8"));
    }

    #[test]
    fn signal_match_without_fallback_sets_none() {
        let source = Signal::new(1);
        let matched = MatchSignal::new(source.read_only())
            .case(1, |_| 100)
            .finish();
        let _subscription = matched.subscribe(|_| {}, SubscribeMode::Normal);

        assert_eq!(matched.get(), Some(100));
        source.set(2);
        assert_eq!(matched.get(), None);
    }
}
