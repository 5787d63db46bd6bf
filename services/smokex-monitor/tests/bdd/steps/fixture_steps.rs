//! BDD step definitions for the fixture-backed receiver

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use smokex_monitor::device::{DeviceApi, HttpDeviceApi};
use smokex_monitor::mock::{FixtureHttpClient, FIXTURE_BASE_URL};
use smokex_monitor::poller::Poller;
use smokex_monitor::settings::DeviceCommand;

use crate::steps::probe_steps::apply;
use crate::world::SmokexWorld;

fn device(world: &SmokexWorld) -> Arc<HttpDeviceApi> {
    Arc::clone(world.device.as_ref().expect("fixture receiver not set"))
}

#[given("the fixture receiver")]
fn fixture_receiver(world: &mut SmokexWorld) {
    world.device = Some(Arc::new(HttpDeviceApi::new(
        FIXTURE_BASE_URL,
        Arc::new(FixtureHttpClient::new(Duration::ZERO)),
    )));
}

#[when("the fixture receiver is polled")]
async fn fixture_polled(world: &mut SmokexWorld) {
    let api: Arc<dyn DeviceApi> = device(world);
    let result = Poller::new(api).poll().await;
    apply(world, result);
}

#[when("the unpair command is sent")]
async fn unpair(world: &mut SmokexWorld) {
    device(world)
        .send_command(&DeviceCommand::Unpair)
        .await
        .expect("unpair failed");
}

#[then("the fixture receiver should report not paired")]
async fn not_paired(world: &mut SmokexWorld) {
    let device = device(world);
    assert!(!device.pairing_status().await.unwrap().is_paired);
    assert!(!device.status().await.unwrap().paired);
}
