//! Owned auth-state cell with explicit subscribe/publish.

// std
use std::sync::Weak;
// crates.io
use parking_lot::ReentrantMutex;
// self
use crate::{_prelude::*, coordinator::AuthState};

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Holds the current [`AuthState`] and fans every transition out to subscribers.
///
/// Listeners run outside the registry lock, so they may subscribe, unsubscribe, or read the
/// state again. Deliveries are serialized: every listener observes transitions in publish order.
#[derive(Clone)]
pub struct StatePublisher {
	inner: Arc<PublisherInner>,
}
impl StatePublisher {
	/// Creates a publisher seeded with `initial`.
	pub fn new(initial: AuthState) -> Self {
		Self {
			inner: Arc::new(PublisherInner {
				state: RwLock::new(initial),
				registry: Mutex::new(Registry::default()),
				delivery: ReentrantMutex::new(()),
			}),
		}
	}

	/// Returns a snapshot of the current state.
	pub fn state(&self) -> AuthState {
		self.inner.state.read().clone()
	}

	/// Replaces the state and notifies every listener synchronously.
	pub fn publish(&self, next: AuthState) {
		let _delivery = self.inner.delivery.lock();

		*self.inner.state.write() = next.clone();

		let listeners = self.inner.registry.lock().snapshot();

		for listener in listeners {
			listener(&next);
		}
	}

	/// Registers a listener and immediately replays the current state to it.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&AuthState) + Send + Sync + 'static,
	{
		let listener: Listener = Arc::new(listener);
		let _delivery = self.inner.delivery.lock();
		let id = self.inner.registry.lock().insert(listener.clone());
		let current = self.state();

		listener(&current);

		Subscription { publisher: Arc::downgrade(&self.inner), id: Some(id) }
	}

	/// Number of registered listeners.
	pub fn subscriber_count(&self) -> usize {
		self.inner.registry.lock().listeners.len()
	}
}
impl Default for StatePublisher {
	fn default() -> Self {
		Self::new(AuthState::logged_out())
	}
}

/// Handle returned by [`StatePublisher::subscribe`]; dropping it removes the listener.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
	publisher: Weak<PublisherInner>,
	id: Option<u64>,
}
impl Subscription {
	/// Removes the listener. Equivalent to dropping the handle.
	pub fn unsubscribe(mut self) {
		self.detach();
	}

	fn detach(&mut self) {
		let Some(id) = self.id.take() else {
			return;
		};

		if let Some(inner) = self.publisher.upgrade() {
			inner.registry.lock().listeners.remove(&id);
		}
	}
}
impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}
impl Drop for Subscription {
	fn drop(&mut self) {
		self.detach();
	}
}

struct PublisherInner {
	state: RwLock<AuthState>,
	registry: Mutex<Registry>,
	delivery: ReentrantMutex<()>,
}

#[derive(Default)]
struct Registry {
	next_id: u64,
	listeners: BTreeMap<u64, Listener>,
}
impl Registry {
	fn insert(&mut self, listener: Listener) -> u64 {
		let id = self.next_id;

		self.next_id += 1;
		self.listeners.insert(id, listener);

		id
	}

	fn snapshot(&self) -> Vec<Listener> {
		self.listeners.values().cloned().collect()
	}
}
