use std::io;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use arbor_shell::config::NOTICE_VERSION;
use arbor_shell::store::{Community, Identity, Reply};
use arbor_shell::{
    AppState, InputEvent, Logger, Node, PlatformEvent, ShellConfig, ShellRuntime, Size, ViewId,
};
use arbor_shell::MemoryHost;

fn navigation_switch_back(c: &mut Criterion) {
    c.bench_function("navigation_switch_back", |b| {
        b.iter(|| {
            let app = seeded_app(0);
            let mut manager = app.build_manager(&ShellConfig::default()).expect("manager");
            for _ in 0..32 {
                manager
                    .request_view_switch(black_box(ViewId::ReplyThread))
                    .expect("switch");
                manager
                    .request_view_switch(black_box(ViewId::ThemeEditor))
                    .expect("switch");
            }
            while manager.handle_back_navigation().is_consumed() {}
        });
    });
}

fn runtime_reply_script(c: &mut Criterion) {
    let script = reply_script();
    c.bench_function("runtime_reply_script", |b| {
        b.iter(|| {
            let mut runtime = build_runtime(200);
            let mut sink = io::sink();
            let mut host = MemoryHost::new();
            runtime
                .run_scripted(&mut sink, &mut host, black_box(script.clone()))
                .expect("scripted run");
        });
    });
}

fn seeded_app(replies: usize) -> AppState {
    let app = AppState::new(None, Logger::null());
    let me = Identity::new("bench", 1);
    let community = Community::new("bench", me.id, 2);
    app.store.add(Node::Identity(me.clone())).expect("identity");
    app.store
        .add(Node::Community(community.clone()))
        .expect("community");

    let mut parent: Option<Reply> = None;
    for n in 0..replies {
        let content = format!("reply {n}");
        let reply = match (&parent, n % 4) {
            (Some(parent), 1..=3) => Reply::child(parent, me.id, content, 10 + n as u64),
            _ => Reply::root(&community, me.id, content, 10 + n as u64),
        };
        app.store.add(Node::Reply(reply.clone())).expect("reply");
        parent = Some(reply);
    }

    app.settings.update(|settings| {
        settings.acknowledged_notice_version = NOTICE_VERSION;
        settings.address = "bench:1".into();
        settings.active_identity = Some(me.id);
    });
    if let Ok(mut active) = app.active.write() {
        *active = Some(community.id);
    }
    app
}

fn build_runtime(replies: usize) -> ShellRuntime {
    let mut app = seeded_app(replies);
    let mut config = ShellConfig {
        metrics_interval: Duration::from_millis(0),
        ..ShellConfig::default()
    };
    config.enable_metrics();
    app.build_runtime(config, Size::new(100, 30)).expect("runtime")
}

fn key(code: KeyCode) -> PlatformEvent {
    PlatformEvent::Input(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

fn reply_script() -> Vec<PlatformEvent> {
    let mut events = vec![key(KeyCode::Down), key(KeyCode::Enter)];
    for _ in 0..40 {
        events.push(key(KeyCode::Down));
    }
    events.push(PlatformEvent::Input(InputEvent::ContextualDismissed));
    events.push(PlatformEvent::Resize(Size::new(80, 24)));
    for _ in 0..10 {
        events.push(key(KeyCode::Up));
    }
    events.push(PlatformEvent::Back);
    events
}

criterion_group!(benches, navigation_switch_back, runtime_reply_script);
criterion_main!(benches);
