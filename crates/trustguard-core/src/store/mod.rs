// ── Reactive session store ──
//
// Watch-channel storage with push-based change notification.

mod session_store;

pub use session_store::SessionStore;
