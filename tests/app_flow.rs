use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use beo_lib::{
    AppPhase, Beo, BreakOutcome, CheckInActivity, CheckInInput, CheckInLocation, Clock,
};

#[derive(Debug)]
struct FixedClock(AtomicU32);

impl FixedClock {
    fn at(hour: u32) -> Arc<Self> {
        Arc::new(Self(AtomicU32::new(hour)))
    }
}

impl Clock for FixedClock {
    fn current_hour(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

async fn tick_n(beo: &Beo, n: usize) {
    for _ in 0..n {
        beo.timer().tick().await;
    }
}

async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn fresh_install_uses_default_limit_until_profile_exists() {
    let dir = tempfile::tempdir().unwrap();
    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(9)).await.unwrap();

    assert!(beo.profile().await.unwrap().is_none());
    assert_eq!(beo.snapshot().await.state.limit_minutes, 45);

    let profile = beo.create_profile(&[3, 3, 3, 3, 3, 3], 10).await.unwrap();
    assert_eq!(profile.bsmas_score, 18);
    assert_eq!(beo.snapshot().await.state.limit_minutes, 10);

    beo.update_hourly_limit(30).await.unwrap();
    assert_eq!(beo.snapshot().await.state.limit_minutes, 30);
    assert_eq!(beo.profile().await.unwrap().unwrap().hourly_limit, 30);

    beo.shutdown().await;
}

#[tokio::test]
async fn limit_breach_opens_one_break_and_records_the_answer() {
    let dir = tempfile::tempdir().unwrap();
    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(14)).await.unwrap();
    beo.create_profile(&[1, 2, 1, 2, 1, 2], 5).await.unwrap();
    let mut breaks = beo.subscribe_breaks();

    tick_n(&beo, 300).await;
    tokio::time::timeout(Duration::from_secs(5), breaks.changed())
        .await
        .unwrap()
        .unwrap();
    let active = beo.active_break().expect("break should be shown");
    assert_eq!(active.hourly_used_seconds, 300);

    let entry = beo.respond_to_break(BreakOutcome::Skipped).await.unwrap();
    assert!(!entry.completed);
    assert!(beo.active_break().is_none());

    tick_n(&beo, 120).await;
    tokio::task::yield_now().await;
    assert!(beo.active_break().is_none());
    assert!(beo.snapshot().await.is_over_limit);

    let stats = beo.today_stats().await.unwrap();
    assert_eq!((stats.completed, stats.skipped, stats.total), (0, 1, 1));
    assert_eq!(beo.recent_history(10).await.unwrap().len(), 1);

    beo.shutdown().await;
}

#[tokio::test]
async fn usage_survives_restart_within_the_hour_only() {
    let dir = tempfile::tempdir().unwrap();

    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(8)).await.unwrap();
    tick_n(&beo, 25).await;
    beo.shutdown().await;

    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(8)).await.unwrap();
    assert_eq!(beo.snapshot().await.state.hourly_used_seconds, 25);
    beo.shutdown().await;

    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(9)).await.unwrap();
    let snapshot = beo.snapshot().await;
    assert_eq!(snapshot.state.hourly_used_seconds, 0);
    assert_eq!(snapshot.state.current_hour, 9);
    beo.shutdown().await;
}

#[tokio::test]
async fn backgrounding_stops_and_foregrounding_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(20)).await.unwrap();
    let lifecycle = beo.lifecycle();
    let app = &beo;

    beo.set_dashboard_active(true).await;
    assert!(beo.timer().is_running().await);

    lifecycle.send(AppPhase::Background).await.unwrap();
    wait_until(move || async move { !app.timer().is_running().await }).await;

    lifecycle.send(AppPhase::Active).await.unwrap();
    wait_until(move || async move { app.timer().is_running().await }).await;

    beo.shutdown().await;
}

#[tokio::test]
async fn reset_wipes_all_user_data() {
    let dir = tempfile::tempdir().unwrap();
    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(11)).await.unwrap();
    beo.create_profile(&[5, 5, 5, 5, 5, 5], 5).await.unwrap();
    beo.save_checkin(CheckInInput {
        mood: 6,
        stress: 4,
        location: CheckInLocation::Home,
        activity: CheckInActivity::Relaxing,
        perceived_hours: Some(2.5),
    })
    .await
    .unwrap();

    let mut breaks = beo.subscribe_breaks();
    tick_n(&beo, 300).await;
    tokio::time::timeout(Duration::from_secs(5), breaks.changed())
        .await
        .unwrap()
        .unwrap();
    beo.respond_to_break(BreakOutcome::Completed).await.unwrap();

    beo.reset().await.unwrap();

    assert!(beo.profile().await.unwrap().is_none());
    assert!(beo.recent_history(10).await.unwrap().is_empty());
    assert!(beo.today_checkin().await.unwrap().is_none());
    let snapshot = beo.snapshot().await;
    assert_eq!(snapshot.state.hourly_used_seconds, 0);
    assert_eq!(snapshot.state.limit_minutes, 45);
    assert!(!snapshot.state.limit_reached);
    beo.shutdown().await;

    let beo = Beo::open_with_clock(dir.path(), FixedClock::at(11)).await.unwrap();
    assert_eq!(beo.snapshot().await.state.hourly_used_seconds, 0);
    beo.shutdown().await;
}
