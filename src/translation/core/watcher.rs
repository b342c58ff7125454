//! 实时观察器
//!
//! 监听文档变更和“设置已变更”信号，合并短时间内的突发事件后重新运行翻译引擎。
//!
//! 合并规则：安静期内的第一个事件启动一个计时器（默认 250ms），计时器未触发前的后续事件
//! 被吸收；计时器触发时清除标记，并以当时读到的语言启动一次新的翻译。
//!
//! `start` 必须在 `LocalSet` 内调用：它启动一个常驻的调度任务。变更回调和设置监听器只向
//! 该任务的通道发送信号，因此在 `LocalSet` 之外修改文档或设置也不会出错，信号会在
//! `LocalSet` 下次运行时处理。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::engine::TranslationEngine;
use crate::parsers::html::{ObserveOptions, ObservedDocument, ObserverHandle};
use crate::settings::{ListenerId, SettingsEvents};
use crate::translation::config::constants;

type LanguageSource = Rc<dyn Fn() -> String>;

/// 回调与调度任务共享的标记
struct SchedulerState {
    scheduled: Cell<bool>,
    stopped: Cell<bool>,
    wake: UnboundedSender<()>,
}

impl SchedulerState {
    fn schedule(&self) {
        if self.stopped.get() || self.scheduled.get() {
            return;
        }
        self.scheduled.set(true);
        // 接收端只在停止后关闭
        let _ = self.wake.send(());
    }
}

/// 读取当前语言并启动一次翻译，不等待其完成
fn spawn_pass(engine: &TranslationEngine, get_language: &LanguageSource) {
    let language = get_language();
    let engine = engine.clone();
    tokio::task::spawn_local(async move {
        engine.translate_ui(&language).await;
    });
}

/// 调度任务：先翻译一次，之后每个信号等待一个合并窗口再翻译
async fn run_scheduler(
    state: Weak<SchedulerState>,
    mut wake: UnboundedReceiver<()>,
    engine: TranslationEngine,
    get_language: LanguageSource,
    debounce: Duration,
) {
    spawn_pass(&engine, &get_language);

    while wake.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        while wake.try_recv().is_ok() {}

        let Some(state) = state.upgrade() else {
            break;
        };
        state.scheduled.set(false);
        if state.stopped.get() {
            break;
        }
        spawn_pass(&engine, &get_language);
    }
}

/// 运行中的实时观察器；`stop` 或丢弃后停止
pub struct LiveWatcher {
    state: Rc<SchedulerState>,
    worker: RefCell<Option<JoinHandle<()>>>,
    observer: RefCell<Option<ObserverHandle>>,
    settings: SettingsEvents,
    listener: Cell<Option<ListenerId>>,
}

impl LiveWatcher {
    /// 立即翻译一次，然后开始观察 `body` 的变更和设置信号
    pub fn start<F>(
        engine: TranslationEngine,
        document: &ObservedDocument,
        settings: &SettingsEvents,
        get_language: F,
    ) -> Self
    where
        F: Fn() -> String + 'static,
    {
        let (tx, rx) = unbounded_channel();
        let state = Rc::new(SchedulerState {
            scheduled: Cell::new(false),
            stopped: Cell::new(false),
            wake: tx,
        });

        let debounce = engine.config().debounce;
        let worker = tokio::task::spawn_local(run_scheduler(
            Rc::downgrade(&state),
            rx,
            engine,
            Rc::new(get_language),
            debounce,
        ));

        let options = ObserveOptions {
            subtree: true,
            child_list: true,
            character_data: true,
            attributes: true,
            attribute_filter: Some(
                constants::TRANSLATABLE_ATTRS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            ),
        };
        let weak = Rc::downgrade(&state);
        let observer = document.observe(&document.body(), options, move |_| {
            if let Some(state) = weak.upgrade() {
                state.schedule();
            }
        });

        let weak = Rc::downgrade(&state);
        let listener = settings.add_listener(move || {
            if let Some(state) = weak.upgrade() {
                state.schedule();
            }
        });

        tracing::debug!("实时翻译观察器已启动");

        Self {
            state,
            worker: RefCell::new(Some(worker)),
            observer: RefCell::new(Some(observer)),
            settings: settings.clone(),
            listener: Cell::new(Some(listener)),
        }
    }

    /// 断开观察、结束调度任务（含待触发的计时器）、移除设置监听器；可重复调用
    pub fn stop(&self) {
        if self.state.stopped.replace(true) {
            return;
        }

        if let Some(observer) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }

        self.state.scheduled.set(false);
        if let Some(worker) = self.worker.borrow_mut().take() {
            worker.abort();
        }

        if let Some(listener) = self.listener.take() {
            self.settings.remove_listener(listener);
        }

        tracing::debug!("实时翻译观察器已停止");
    }

    pub fn is_running(&self) -> bool {
        !self.state.stopped.get()
    }

    /// 是否有一次待触发的翻译
    pub fn is_scheduled(&self) -> bool {
        self.state.scheduled.get()
    }
}

impl Drop for LiveWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

thread_local! {
    static ACTIVE_WATCHER: RefCell<Option<LiveWatcher>> = const { RefCell::new(None) };
}

/// 启动当前线程唯一的实时观察器；已有实例时先停止它
pub fn start_auto_translate_ui<F>(
    engine: TranslationEngine,
    document: &ObservedDocument,
    settings: &SettingsEvents,
    get_language: F,
) where
    F: Fn() -> String + 'static,
{
    stop_auto_translate_ui();
    let watcher = LiveWatcher::start(engine, document, settings, get_language);
    ACTIVE_WATCHER.with(|slot| *slot.borrow_mut() = Some(watcher));
}

/// 停止当前线程的实时观察器
pub fn stop_auto_translate_ui() {
    let previous = ACTIVE_WATCHER.with(|slot| slot.borrow_mut().take());
    if let Some(watcher) = previous {
        watcher.stop();
    }
}

/// 当前线程是否有运行中的实时观察器
pub fn auto_translate_running() -> bool {
    ACTIVE_WATCHER.with(|slot| slot.borrow().as_ref().is_some_and(LiveWatcher::is_running))
}
