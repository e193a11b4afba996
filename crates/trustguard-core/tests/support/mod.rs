// Shared fakes for the controller and consent integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use trustguard_core::{
    BackendError, ConnectionState, ConsentDecision, ConsentPrompt, ConsentProvider,
    ForegroundHook, PeerStats, ResumeToken, SessionSnapshot, SessionStore, SnapshotStream,
    TunnelBackend, TunnelConfiguration, TunnelIdentity,
};

pub const CONFIG: &str = "\
[Interface]
PrivateKey = cGxhY2Vob2xkZXI=
Address = 10.8.0.2/32

[Peer]
PublicKey = cGVlcg==
Endpoint = vpn.example.net:51820
AllowedIPs = 0.0.0.0/0
";

pub const OTHER_CONFIG: &str = "\
[Interface]
PrivateKey = b3RoZXI=

[Peer]
Endpoint = other.example.net:51820
";

// ── Scripted backend ────────────────────────────────────────────────

/// Backend whose answers are set by the test. Records every call and the
/// snapshot state visible at the moment of the call.
#[derive(Default)]
pub struct ScriptedBackend {
    pub up_error: Mutex<Option<String>>,
    pub down_error: Mutex<Option<String>>,
    pub stats_delay: Mutex<Duration>,
    pub stats_rx: AtomicUsize,
    panic_up: AtomicBool,
    calls: Mutex<Vec<String>>,
    observed: Mutex<Vec<ConnectionState>>,
    store: Mutex<Option<Arc<SessionStore>>>,
    stats_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn watch(&self, store: &Arc<SessionStore>) {
        *self.store.lock().unwrap() = Some(Arc::clone(store));
    }

    pub fn fail_up(&self, reason: &str) {
        *self.up_error.lock().unwrap() = Some(reason.into());
    }

    /// The next `bring_up` panics instead of returning.
    pub fn panic_next_up(&self) {
        self.panic_up.store(true, Ordering::SeqCst);
    }

    pub fn heal_up(&self) {
        *self.up_error.lock().unwrap() = None;
    }

    pub fn fail_down(&self, reason: &str) {
        *self.down_error.lock().unwrap() = Some(reason.into());
    }

    pub fn slow_stats(&self, delay: Duration) {
        *self.stats_delay.lock().unwrap() = delay;
    }

    /// Tunnel calls (`up`/`down`), excluding statistics sampling.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Snapshot states seen at each `up`/`down` call.
    pub fn observed(&self) -> Vec<ConnectionState> {
        self.observed.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.into());
        if let Some(store) = self.store.lock().unwrap().as_ref() {
            self.observed.lock().unwrap().push(store.snapshot().state.clone());
        }
    }
}

#[async_trait]
impl TunnelBackend for ScriptedBackend {
    async fn bring_up(
        &self,
        _tunnel: &TunnelIdentity,
        _config: &TunnelConfiguration,
    ) -> Result<String, BackendError> {
        self.record("up");
        assert!(!self.panic_up.swap(false, Ordering::SeqCst), "engine crashed");
        let error = self.up_error.lock().unwrap().clone();
        match error {
            Some(reason) => Err(BackendError::Rejected(reason)),
            None => Ok("UP".into()),
        }
    }

    async fn bring_down(&self, _tunnel: &TunnelIdentity) -> Result<String, BackendError> {
        self.record("down");
        let error = self.down_error.lock().unwrap().clone();
        match error {
            Some(reason) => Err(BackendError::Rejected(reason)),
            None => Ok("DOWN".into()),
        }
    }

    async fn stats(&self, _tunnel: &TunnelIdentity) -> Result<Option<PeerStats>, BackendError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.stats_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let rx = u64::try_from(self.stats_rx.fetch_add(100, Ordering::SeqCst)).unwrap();
        Ok(Some(PeerStats {
            rx_bytes: rx,
            tx_bytes: rx / 2,
            latest_handshake_epoch_millis: 0,
            peer_id: "cGVlcg==".into(),
        }))
    }
}

// ── Foreground recorder ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingForeground {
    pub events: Mutex<Vec<String>>,
}

impl RecordingForeground {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ForegroundHook for RecordingForeground {
    fn enter(&self, endpoint: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("enter:{}", endpoint.unwrap_or("-")));
    }

    fn leave(&self) {
        self.events.lock().unwrap().push("leave".into());
    }
}

// ── Consent providers ───────────────────────────────────────────────

/// Provider with a fixed grant state and a fixed prompt answer.
pub struct FixedConsent {
    pub granted: bool,
    pub answer: ConsentPrompt,
    pub prompts: Mutex<Vec<ResumeToken>>,
}

impl FixedConsent {
    pub fn granted() -> Arc<Self> {
        Arc::new(Self {
            granted: true,
            answer: ConsentPrompt::Immediate(ConsentDecision::Granted),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(answer: ConsentPrompt) -> Arc<Self> {
        Arc::new(Self {
            granted: false,
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl ConsentProvider for FixedConsent {
    fn is_granted(&self) -> bool {
        self.granted
    }

    fn request(&self, token: ResumeToken) -> ConsentPrompt {
        self.prompts.lock().unwrap().push(token);
        self.answer
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Wait until the snapshot satisfies `pred`, failing after 10 s.
pub async fn wait_for(
    stream: &mut SnapshotStream,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> Arc<SessionSnapshot> {
    let wait = async {
        let latest = stream.latest();
        if pred(&latest) {
            return latest;
        }
        loop {
            let snap = stream.changed().await.unwrap();
            if pred(&snap) {
                return snap;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), wait).await.unwrap()
}
