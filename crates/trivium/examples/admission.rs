//! Walk one gate through the full admission lifecycle: mint an identity,
//! conduct, latch, and reset — with transitions republished through the
//! bridge to an in-memory bus.
//!
//! Run with `RUST_LOG=debug cargo run --example admission` for the full
//! hot-path trace.

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivium::{
    identity_frame, reset_frame, reset_message, Admission, Bridge, CrystalKind, GateConfig,
    GateId, GateState, IdentityEncoding, InMemoryBus, Pipeline, PipelineConfig, ResonanceProfile,
    TickInput, TopicMap, VotingPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let signing = SigningKey::from_bytes(&[42u8; 32]);
    let config = PipelineConfig {
        profiles: vec![
            ResonanceProfile::preset(CrystalKind::Orbital),
            ResonanceProfile::preset(CrystalKind::Silent),
        ],
        policy: VotingPolicy::Any,
        gate: GateConfig::default(),
        reset_verifying_key: signing.verifying_key().to_bytes(),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let bus = Arc::new(InMemoryBus::new());
    let bridge = Bridge::new(rx, bus.clone(), TopicMap::default(), shutdown_rx);
    let bridge_task = tokio::spawn(bridge.run());

    let pipeline = Pipeline::from_config(&config)?.with_transition_sink(tx);
    let gate = GateId::new("uplink-7");

    let tokens = ["route", "uplink", "alpha"];
    let input = TickInput {
        domain: 0x0102,
        phase: 0x0001,
        descriptor: &tokens,
        delta_angle_deg: 1.5,
        agent: 42,
        task: 7,
        sequence: 1,
        entropy: 0.6,
    };
    let identity = pipeline.generator().mint(&input, None)?;
    info!(generation = identity.lineage_anchor.generation, "identity minted");

    // A healthy frame conducts, a perfect one latches.
    for (entropy, drift) in [(0.55, 2.0), (1.0, 0.0)] {
        let frame = identity_frame(&identity, GateState::Off, drift, entropy, IdentityEncoding::Full);
        match pipeline.admit(&gate, &frame)? {
            Admission::Scored(report) => info!(
                admitted = report.admitted,
                state = %report.state,
                strength = report.ring_strength,
                directive = ?report.directive,
                "frame scored"
            ),
            other => info!(?other, "frame not scored"),
        }
    }

    // Only an authorized reset leaves Latched.
    let nonce = [9u8; 8];
    let signature = signing.sign(&reset_message(&gate, &nonce));
    let admission = pipeline.admit(&gate, &reset_frame(nonce, signature.to_bytes()))?;
    info!(?admission, "gate reset");

    // Dropping the pipeline closes the sink; the bridge drains and stops.
    drop(pipeline);
    bridge_task.await?;
    info!(transitions = bus.published().len(), "bridge republished");
    Ok(())
}
