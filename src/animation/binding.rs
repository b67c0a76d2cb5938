use super::behavior::PropertyBehavior;
use super::property::{BehaviorToken, ListenerId, Property, WeakProperty};

enum Source<T> {
    Property(Property<T>),
    Function(Box<dyn Fn() -> T>),
}

/// Makes a property mirror another property or a function.
///
/// A binding never finishes. When bound to a property it listens to that
/// property and pushes every change to its owner immediately, for as long as
/// it is still the owner's behavior.
pub struct Binding<T> {
    source: Source<T>,
    bidirectional: bool,
    listener: Option<(WeakProperty<T>, ListenerId)>,
}

impl<T: Clone + PartialEq + 'static> Binding<T> {
    /// One-way mirror of `source`.
    #[must_use]
    pub fn to(source: &Property<T>) -> Self {
        Self {
            source: Source::Property(source.clone()),
            bidirectional: false,
            listener: None,
        }
    }

    /// Mirror of `source` that is handed back to `source` when broken.
    #[must_use]
    pub fn bidirectional(source: &Property<T>) -> Self {
        Self {
            source: Source::Property(source.clone()),
            bidirectional: true,
            listener: None,
        }
    }

    /// Recomputes the value from `f` every tick.
    #[must_use]
    pub fn function(f: impl Fn() -> T + 'static) -> Self {
        Self {
            source: Source::Function(Box::new(f)),
            bidirectional: false,
            listener: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    #[must_use]
    pub fn source(&self) -> Option<&Property<T>> {
        match &self.source {
            Source::Property(p) => Some(p),
            Source::Function(_) => None,
        }
    }
}

impl<T: Clone + PartialEq + 'static> PropertyBehavior<T> for Binding<T> {
    fn update_animation(&mut self, _elapsed: i32) -> bool {
        true
    }

    fn fast_forward(&mut self) {}

    fn is_finished(&self) -> bool {
        false
    }

    fn value(&self) -> T {
        match &self.source {
            Source::Property(p) => p.get(),
            Source::Function(f) => f(),
        }
    }

    fn binding_source(&self) -> Option<(&Property<T>, bool)> {
        self.source().map(|p| (p, self.bidirectional))
    }

    fn attach(&mut self, owner: &Property<T>, token: BehaviorToken) {
        let Source::Property(source) = &self.source else {
            return;
        };

        let target = owner.downgrade();
        let weak_source = source.downgrade();
        let id = source.add_listener(move |_| {
            let (Some(target), Some(source)) = (target.upgrade(), weak_source.upgrade()) else {
                return;
            };
            // Stale listeners stay silent until `detach` removes them.
            if target.behavior_token() == Some(token) {
                target.set_value(source.get());
            }
        });
        self.listener = Some((source.downgrade(), id));
    }

    fn detach(&mut self) {
        if let Some((source, id)) = self.listener.take()
            && let Some(source) = source.upgrade()
        {
            source.remove_listener(id);
        }
    }
}

impl<T> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Property(p) => format!("{}", p.id()),
            Source::Function(_) => "fn".to_string(),
        };
        f.debug_struct("Binding")
            .field("source", &source)
            .field("bidirectional", &self.bidirectional)
            .finish()
    }
}
