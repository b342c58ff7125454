//! 取消语义集成测试
//!
//! 较新的 `translate_ui` 调用会取代较旧的调用；旧调用不再写 DOM

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use std::rc::Rc;
use std::time::Duration;

use common::*;
use mindweaver::translation::EngineConfig;
use tokio::task::LocalSet;

const THREE_PARAGRAPHS: &str = "<html><body><p>Alpha</p><p>Bravo</p><p>Charlie</p></body></html>";

#[tokio::test(start_paused = true)]
async fn test_newer_call_supersedes_between_batches() {
    let stub = Rc::new(
        StubTranslator::new()
            .with_delay("fr", Duration::from_millis(100))
            .with_delay("de", Duration::from_millis(100)),
    );
    let config = EngineConfig {
        batch_size: 1,
        ..EngineConfig::default()
    };
    let (engine, document, _store) = engine_for(THREE_PARAGRAPHS, stub.clone(), config);

    let local = LocalSet::new();
    local
        .run_until(async {
            let french = {
                let engine = engine.clone();
                tokio::task::spawn_local(async move { engine.translate_ui("fr").await })
            };
            // 让法语调用先发出第一批
            tokio::task::yield_now().await;

            engine.translate_ui("de").await;
            french.await.expect("french task");
        })
        .await;

    for (idx, source) in ["Alpha", "Bravo", "Charlie"].iter().enumerate() {
        assert_eq!(text_of(&document, "p", idx), format!("[de] {}", source));
    }

    let french_calls = stub.calls().iter().filter(|call| call.language == "fr").count();
    assert_eq!(french_calls, 1, "superseded call must not start further batches");
    assert_eq!(engine.stats().cancelled_passes, 1);
    assert_eq!(engine.last_requested_language(), "de");

    println!("✅ Supersede between batches test passed");
}

#[tokio::test(start_paused = true)]
async fn test_slow_superseded_call_never_writes_dom() {
    let stub = Rc::new(
        StubTranslator::new()
            .with_delay("fr", Duration::from_millis(500))
            .with_delay("de", Duration::from_millis(50)),
    );
    let (engine, document, _store) = engine_for(THREE_PARAGRAPHS, stub.clone(), EngineConfig::default());

    let local = LocalSet::new();
    local
        .run_until(async {
            let french = {
                let engine = engine.clone();
                tokio::task::spawn_local(async move { engine.translate_ui("fr").await })
            };
            tokio::task::yield_now().await;

            engine.translate_ui("de").await;
            assert_eq!(text_of(&document, "p", 0), "[de] Alpha");

            // 法语的唯一一批在德语写完之后才返回
            french.await.expect("french task");
        })
        .await;

    assert_eq!(text_of(&document, "p", 0), "[de] Alpha");
    assert_eq!(text_of(&document, "p", 2), "[de] Charlie");
    assert_eq!(engine.stats().cancelled_passes, 1);

    println!("✅ Slow superseded call test passed");
}

#[tokio::test(start_paused = true)]
async fn test_switch_back_to_native_while_translating() {
    let stub = Rc::new(StubTranslator::new().with_delay("es", Duration::from_millis(200)));
    let (engine, document, _store) = engine_for(THREE_PARAGRAPHS, stub.clone(), EngineConfig::default());
    let before = html_of(&document);

    let local = LocalSet::new();
    local
        .run_until(async {
            let spanish = {
                let engine = engine.clone();
                tokio::task::spawn_local(async move { engine.translate_ui("es").await })
            };
            tokio::task::yield_now().await;

            engine.translate_ui("en").await;
            spanish.await.expect("spanish task");
        })
        .await;

    assert_eq!(html_of(&document), before);
    assert_eq!(engine.stats().cancelled_passes, 1);

    println!("✅ Switch back to native test passed");
}
