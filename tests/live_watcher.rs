//! 实时观察器集成测试
//!
//! 使用暂停的时钟验证：启动即翻译、突发变更合并为一次、设置信号触发重译、停止后不再响应

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use std::rc::Rc;
use std::time::Duration;

use common::*;
use markup5ever_rcdom::Handle;
use mindweaver::translation::{
    auto_translate_running, start_auto_translate_ui, stop_auto_translate_ui, EngineConfig, LiveWatcher,
    MemoryStore,
};
use mindweaver::{ObservedDocument, SettingsEvents, UserSettings};
use tokio::task::LocalSet;
use tokio::time::sleep;

fn settings_with(language: &str) -> UserSettings {
    let settings = UserSettings::new(Rc::new(MemoryStore::new()), SettingsEvents::new());
    settings.update_language(language);
    settings
}

fn append_paragraph(document: &ObservedDocument, text: &str) -> Handle {
    let paragraph = document.create_element("p", &[]);
    let node = document.create_text(text);
    document.append_child(&paragraph, &node);
    document.append_child(&element(document, "main", 0), &paragraph);
    paragraph
}

#[tokio::test(start_paused = true)]
async fn test_initial_pass_and_debounced_burst() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let settings = settings_with("es");

    LocalSet::new()
        .run_until(async {
            let language = settings.clone();
            let watcher = LiveWatcher::start(engine.clone(), &document, settings.events(), move || {
                language.language()
            });

            sleep(Duration::from_millis(10)).await;
            assert_eq!(stub.call_count(), 1, "start must run one pass immediately");
            assert_eq!(text_of(&document, "p", 0), "[es] Hello world");

            // 引擎自身的写入只会引发一次全部命中缓存的复查
            sleep(Duration::from_millis(300)).await;
            assert_eq!(stub.call_count(), 1);
            assert!(!watcher.is_scheduled());

            append_paragraph(&document, "First new line");
            append_paragraph(&document, "Second new line");
            append_paragraph(&document, "Third new line");
            assert!(watcher.is_scheduled());

            sleep(Duration::from_millis(100)).await;
            assert_eq!(stub.call_count(), 1, "nothing runs inside the quiet window");

            sleep(Duration::from_millis(200)).await;
            assert_eq!(stub.call_count(), 2, "a burst coalesces into one pass");
            assert_eq!(stub.calls()[1].texts.len(), 3);
            assert_eq!(text_of(&document, "p", 5), "[es] Third new line");

            watcher.stop();
        })
        .await;

    println!("✅ Initial pass and debounce test passed");
}

#[tokio::test(start_paused = true)]
async fn test_settings_change_triggers_retranslation() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let original = html_of(&document);
    let settings = settings_with("es");

    LocalSet::new()
        .run_until(async {
            let language = settings.clone();
            let watcher = LiveWatcher::start(engine.clone(), &document, settings.events(), move || {
                language.language()
            });
            sleep(Duration::from_millis(300)).await;
            assert_eq!(text_of(&document, "h1", 0), "[es] Welcome back");

            settings.update_language("de");
            assert!(watcher.is_scheduled());
            sleep(Duration::from_millis(300)).await;
            assert_eq!(text_of(&document, "h1", 0), "[de] Welcome back");
            assert_eq!(
                attr_of(&document, "input", 0, "placeholder").as_deref(),
                Some("[de] Search...")
            );

            settings.update_language("en");
            sleep(Duration::from_millis(300)).await;
            assert_eq!(html_of(&document), original);

            watcher.stop();
        })
        .await;

    let languages: Vec<String> = stub.calls().iter().map(|call| call.language.clone()).collect();
    assert_eq!(languages, vec!["es".to_string(), "de".to_string()]);

    println!("✅ Settings change test passed");
}

#[tokio::test(start_paused = true)]
async fn test_stop_detaches_everything() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let settings = settings_with("es");

    LocalSet::new()
        .run_until(async {
            let language = settings.clone();
            let watcher = LiveWatcher::start(engine.clone(), &document, settings.events(), move || {
                language.language()
            });
            sleep(Duration::from_millis(300)).await;
            assert_eq!(document.observer_count(), 1);
            assert_eq!(settings.events().listener_count(), 1);

            // 计时器待触发时停止
            append_paragraph(&document, "Pending line");
            assert!(watcher.is_scheduled());
            watcher.stop();
            watcher.stop();

            assert!(!watcher.is_running());
            assert!(!watcher.is_scheduled());
            assert_eq!(document.observer_count(), 0);
            assert_eq!(settings.events().listener_count(), 0);

            append_paragraph(&document, "Ignored line");
            settings.update_language("de");
            sleep(Duration::from_millis(600)).await;
        })
        .await;

    assert_eq!(stub.call_count(), 1);
    assert_eq!(text_of(&document, "p", 3), "Pending line");

    println!("✅ Stop test passed");
}

#[tokio::test(start_paused = true)]
async fn test_auto_translate_is_a_singleton() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let settings = settings_with("fr");

    LocalSet::new()
        .run_until(async {
            for _ in 0..2 {
                let language = settings.clone();
                start_auto_translate_ui(engine.clone(), &document, settings.events(), move || {
                    language.language()
                });
            }

            assert!(auto_translate_running());
            assert_eq!(document.observer_count(), 1);
            assert_eq!(settings.events().listener_count(), 1);

            sleep(Duration::from_millis(300)).await;
            assert_eq!(text_of(&document, "p", 0), "[fr] Hello world");

            stop_auto_translate_ui();
            stop_auto_translate_ui();

            assert!(!auto_translate_running());
            assert_eq!(document.observer_count(), 0);
            assert_eq!(settings.events().listener_count(), 0);
        })
        .await;

    // 第一个观察器在调度任务运行前就被替换，只有第二个执行初始翻译
    assert_eq!(stub.call_count(), 1);

    println!("✅ Singleton watcher test passed");
}

#[tokio::test(start_paused = true)]
async fn test_events_outside_local_set_are_deferred() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let settings = settings_with("es");
    let local = LocalSet::new();

    let watcher = local
        .run_until(async {
            let language = settings.clone();
            let watcher = LiveWatcher::start(engine.clone(), &document, settings.events(), move || {
                language.language()
            });
            sleep(Duration::from_millis(300)).await;
            watcher
        })
        .await;
    assert_eq!(text_of(&document, "h1", 0), "[es] Welcome back");

    // 不在 LocalSet 内：只记录信号，不启动任务
    settings.update_language("de");
    append_paragraph(&document, "Late line");
    assert!(watcher.is_scheduled());
    assert_eq!(stub.call_count(), 1);

    local.run_until(sleep(Duration::from_millis(300))).await;

    assert_eq!(text_of(&document, "h1", 0), "[de] Welcome back");
    assert_eq!(text_of(&document, "p", 3), "[de] Late line");
    assert_eq!(stub.call_count(), 2);

    watcher.stop();

    println!("✅ Deferred events test passed");
}

#[tokio::test(start_paused = true)]
async fn test_dropping_watcher_stops_it() {
    let stub = Rc::new(StubTranslator::new());
    let (engine, document, _store) = engine_for(LANDING_PAGE, stub.clone(), EngineConfig::default());
    let settings = settings_with("es");

    LocalSet::new()
        .run_until(async {
            {
                let language = settings.clone();
                let _watcher = LiveWatcher::start(engine.clone(), &document, settings.events(), move || {
                    language.language()
                });
                sleep(Duration::from_millis(10)).await;
            }

            assert_eq!(document.observer_count(), 0);
            assert_eq!(settings.events().listener_count(), 0);
        })
        .await;

    println!("✅ Drop watcher test passed");
}
