use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aquadash_notify::notification::{FileBackend, KeyValueRepository, MemoryBackend};
use aquadash_notify::toast::{ToastHostConfig, DEFAULT_DURATION};
use aquadash_notify::{
    Kind, NewNotification, NotificationCenter, NotificationRepository, SequentialIds, Toast,
    ToastBus, ToastHost, TokioScheduler,
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};

async fn open_file_center(dir: &Path) -> NotificationCenter {
    let repo = Arc::new(KeyValueRepository::new(Arc::new(FileBackend::new(dir))));
    NotificationCenter::builder(repo).build().await
}

// 端到端：新增 -> 已读 -> 删除
#[tokio::test]
async fn test_low_oxygen_lifecycle() {
    let repo = Arc::new(KeyValueRepository::new(Arc::new(MemoryBackend::new())));
    let center = NotificationCenter::builder(repo).build().await;

    let record = center
        .add(NewNotification::new("Low oxygen", Kind::Warning))
        .await
        .unwrap();
    assert!(!center.items()[0].read);

    center.mark_read(&record.id).await.unwrap();
    assert!(center.items()[0].read);

    center.dismiss(&record.id).await.unwrap();
    assert_eq!(center.items().len(), 0);
}

#[tokio::test]
async fn test_center_survives_restart_with_file_backend() {
    let temp = tempfile::tempdir().unwrap();

    let center = open_file_center(temp.path()).await;
    let first = center.add(NewNotification::new("Feed delivered", Kind::Success)).await.unwrap();
    center
        .add(NewNotification::new("Water temp high", Kind::Warning).with_route("/ponds/2"))
        .await
        .unwrap();
    center.mark_read(&first.id).await.unwrap();
    let before = center.items();
    drop(center);

    let reopened = open_file_center(temp.path()).await;
    assert_eq!(reopened.items(), before);
    assert_eq!(reopened.items()[0].title, "Water temp high");
    assert_eq!(reopened.unread_count(), 1);
}

#[tokio::test]
async fn test_saving_250_keeps_200_most_recent() {
    let repo = KeyValueRepository::new(Arc::new(MemoryBackend::new()));
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let list: Vec<_> = (0..250)
        .rev()
        .map(|i| {
            NewNotification::new(format!("sensor {}", i), Kind::Info)
                .into_record(format!("id-{}", i), base + ChronoDuration::seconds(i))
        })
        .collect();

    repo.save(&list).await.unwrap();
    let loaded = repo.load().await.unwrap();

    assert_eq!(loaded.len(), 200);
    assert_eq!(loaded.first().unwrap().id, "id-249");
    assert_eq!(loaded.last().unwrap().id, "id-50");
}

#[tokio::test]
async fn test_center_and_host_share_bus() {
    let bus = ToastBus::with_id_generator(Arc::new(SequentialIds::new("toast")));
    let repo = Arc::new(KeyValueRepository::new(Arc::new(MemoryBackend::new())));
    let center = NotificationCenter::builder(repo).bus(bus.clone()).build().await;

    let scheduler = aquadash_notify::ManualScheduler::new();
    let host = ToastHost::mount(&bus, Arc::new(scheduler.clone()), ToastHostConfig::default());

    center
        .add_with_toast(NewNotification::new("Aerator restarted", Kind::Info))
        .await
        .unwrap();
    center.toast("Report exported", Kind::Success);

    let visible = host.visible();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[0].id, "toast-1");
    assert_eq!(visible[1].message, "Report exported");
    // toast 不进入持久化列表
    assert_eq!(center.items().len(), 1);

    scheduler.advance(DEFAULT_DURATION);
    assert!(host.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toast_capacity_and_expiry_with_tokio_timers() {
    let bus = ToastBus::new();
    let scheduler = Arc::new(TokioScheduler::try_current().unwrap());
    let host = ToastHost::mount(
        &bus,
        scheduler,
        ToastHostConfig {
            max_visible: 3,
            duration: Duration::from_millis(3500),
        },
    );

    for i in 1..=5 {
        bus.publish(format!("reading {}", i), Kind::Info);
    }
    let messages: Vec<String> = host.visible().into_iter().map(|t| t.message).collect();
    assert_eq!(messages, vec!["reading 3", "reading 4", "reading 5"]);

    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(host.len(), 3);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(host.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unmounted_host_timers_never_fire() {
    let bus = ToastBus::new();
    let scheduler = Arc::new(TokioScheduler::try_current().unwrap());
    let host = ToastHost::mount(&bus, scheduler, ToastHostConfig::default());

    bus.publish("pending", Kind::Info);
    assert_eq!(host.pending_timers(), 1);

    host.dispose();
    assert_eq!(host.pending_timers(), 0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(host.is_empty());
}

#[test]
fn test_unsubscribed_listener_not_invoked() {
    let bus = ToastBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let sub = bus.subscribe(move |_: &Toast| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    bus.publish("one", Kind::Info);
    sub.unsubscribe();
    bus.publish("two", Kind::Info);
    bus.publish("three", Kind::Error);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
