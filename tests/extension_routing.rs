// tests/extension_routing.rs
//! Panel -> background -> tab routing, with every context wired in-process

use std::future::Future;

use futures_lite::future;
use pretty_assertions::assert_eq;
use serde_json::Value;
use typeswap::dummy_backend::{FakeFace, FakeMeasurer, MemoryStore, RecordingStyleHost};
use typeswap::{
    local_channel, BackgroundRelay, CommitOutcome, ContentHandler, Envelope, FontChannel, FontWeight, LocalEndpoint,
    LocalTransport, PanelController, Request, StyleHost, TabRouter, Transport, TypeswapError,
};

const STYLE_ID: &str = "font-override-style";

type Content = ContentHandler<FakeMeasurer, RecordingStyleHost>;

/// Tabs reachable over local channels
struct LocalTabs {
    active: Option<u32>,
    tabs: Vec<(u32, LocalTransport)>,
    /// Weight checks are lost on the way to the tab
    drop_weight_checks: bool,
}

impl TabRouter for LocalTabs {
    async fn active_tab(&self) -> Option<u32> {
        self.active
    }

    async fn send_to_tab(&self, tab_id: u32, envelope: Envelope) -> Result<Value, TypeswapError> {
        if self.drop_weight_checks && matches!(envelope.request, Request::CheckFontWeights(_)) {
            return Err(TypeswapError::DeliveryFailed {
                message: "Could not establish connection".to_string(),
            });
        }
        let (_, transport) = self
            .tabs
            .iter()
            .find(|(id, _)| *id == tab_id)
            .ok_or_else(|| TypeswapError::DeliveryFailed {
                message: format!("no tab with id {}", tab_id),
            })?;
        transport.send(envelope).await
    }
}

fn page() -> Content {
    let measurer = FakeMeasurer::new()
        .with_face(FakeFace::new("Georgia", 0.58, 1.14).with_feature("liga", -0.3))
        .with_face(FakeFace::new("Inter", 0.55, 1.21).with_weights(&[400, 700, 900]));
    ContentHandler::new(measurer, RecordingStyleHost::new())
}

type Panel = PanelController<LocalTransport, MemoryStore>;

/// Background relay plus the inboxes of tabs 1 and 2
struct Wiring {
    background: BackgroundRelay<LocalTabs>,
    background_inbox: LocalEndpoint,
    tab_inboxes: [LocalEndpoint; 2],
}

fn extension(active: Option<u32>, panel_tab: Option<u32>) -> (Panel, Wiring) {
    wired(active, panel_tab, false)
}

fn wired(active: Option<u32>, panel_tab: Option<u32>, drop_weight_checks: bool) -> (Panel, Wiring) {
    let (to_background, background_inbox) = local_channel("background");
    let (to_first, first_inbox) = local_channel("tab 1");
    let (to_second, second_inbox) = local_channel("tab 2");
    let channel = match panel_tab {
        Some(id) => FontChannel::new(to_background).with_tab(id),
        None => FontChannel::new(to_background),
    };
    let tabs = LocalTabs {
        active,
        tabs: vec![(1, to_first), (2, to_second)],
        drop_weight_checks,
    };
    (
        PanelController::new(channel, MemoryStore::new()),
        Wiring {
            background: BackgroundRelay::new(tabs),
            background_inbox,
            tab_inboxes: [first_inbox, second_inbox],
        },
    )
}

/// Run `action` while the background and both pages answer requests
async fn routed<F: Future>(wiring: &mut Wiring, pages: &mut [Content; 2], action: F) -> F::Output {
    let [first, second] = pages;
    let [first_inbox, second_inbox] = &wiring.tab_inboxes;
    let serving = future::zip(
        wiring.background_inbox.serve(&mut wiring.background),
        future::zip(first_inbox.serve(first), second_inbox.serve(second)),
    );
    future::or(action, async {
        serving.await;
        future::pending::<F::Output>().await
    })
    .await
}

#[test]
fn test_commit_reaches_active_tab_through_background() {
    smol::block_on(async {
        let (panel, mut wiring) = extension(Some(2), None);
        let mut pages = [page(), page()];

        let outcome = routed(&mut wiring, &mut pages, panel.commit_font_name("Inter")).await;
        assert_eq!(outcome.unwrap(), CommitOutcome::Applied);
        assert_eq!(panel.view().available_weights, FontWeight::ALL.to_vec());

        assert_eq!(pages[0].injector().host().count_styles(STYLE_ID), 0);
        assert_eq!(pages[1].injector().host().count_styles(STYLE_ID), 1);
        assert_eq!(pages[1].last_applied().unwrap().font_name, "Inter");
    });
}

#[test]
fn test_panel_tab_overrides_active_tab() {
    smol::block_on(async {
        let (panel, mut wiring) = extension(Some(2), Some(1));
        let mut pages = [page(), page()];

        let outcome = routed(&mut wiring, &mut pages, panel.commit_font_name("Georgia")).await;
        assert_eq!(outcome.unwrap(), CommitOutcome::Applied);
        assert_eq!(pages[0].injector().host().count_styles(STYLE_ID), 1);
        assert_eq!(pages[1].injector().host().count_styles(STYLE_ID), 0);

        routed(&mut wiring, &mut pages, panel.reset_fonts()).await.unwrap();
        assert_eq!(pages[0].injector().host().count_styles(STYLE_ID), 0);
        assert_eq!(panel.view().selection.font_name, "Georgia");
    });
}

#[test]
fn test_no_active_tab_reads_as_not_found() {
    smol::block_on(async {
        let (panel, mut wiring) = extension(None, None);
        let mut pages = [page(), page()];

        let outcome = routed(&mut wiring, &mut pages, panel.commit_font_name("Georgia")).await;
        assert_eq!(outcome.unwrap(), CommitOutcome::NotFound);
        assert_eq!(panel.view().error.as_deref(), Some("No active tab"));
        assert_eq!(panel.view().selection.font_name, "");
    });
}

#[test]
fn test_unreachable_tab_surfaces_delivery_error() {
    smol::block_on(async {
        let (panel, mut wiring) = extension(Some(1), Some(9));
        let mut pages = [page(), page()];

        let outcome = routed(&mut wiring, &mut pages, panel.commit_font_name("Georgia")).await;
        assert_eq!(outcome.unwrap(), CommitOutcome::NotFound);
        assert_eq!(
            panel.view().error.as_deref(),
            Some("Message delivery failed: no tab with id 9")
        );

        routed(&mut wiring, &mut pages, panel.reset_all()).await.unwrap();
        assert_eq!(
            panel.view().error.as_deref(),
            Some("Message delivery failed: no tab with id 9")
        );
    });
}

#[test]
fn test_lost_weight_check_allows_every_weight() {
    smol::block_on(async {
        let (panel, mut wiring) = wired(Some(1), None, true);
        let mut pages = [page(), page()];

        let outcome = routed(&mut wiring, &mut pages, panel.commit_font_name("Georgia")).await;
        assert_eq!(outcome.unwrap(), CommitOutcome::Applied);

        let view = panel.view();
        assert_eq!(view.available_weights, FontWeight::ALL.to_vec());
        assert_eq!(view.error, None);
        assert_eq!(pages[0].injector().host().count_styles(STYLE_ID), 1);
    });
}
