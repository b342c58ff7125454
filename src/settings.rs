//! 用户设置与“设置已变更”信号
//!
//! 语言偏好保存在键值存储的 `mw_language` 下；未设置时依次回退到系统区域设置和 `en`。
//! 更新偏好后广播信号，实时观察器据此重新翻译。

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use crate::translation::config::constants;
use crate::translation::storage::KeyValueStore;

/// 监听器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

/// “设置已变更”事件的监听器注册表，克隆共享同一注册表
#[derive(Clone, Default)]
pub struct SettingsEvents {
    registry: Rc<RefCell<ListenerRegistry>>,
}

impl SettingsEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 事件名称
    pub fn name(&self) -> &'static str {
        constants::SETTINGS_CHANGED_EVENT
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.listeners.push((id, Rc::new(listener)));
        id
    }

    /// 移除监听器，不存在时返回 `false`
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(existing, _)| *existing != id);
        registry.listeners.len() != before
    }

    /// 通知所有监听器
    pub fn emit(&self) {
        let listeners: Vec<Listener> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::trace!("{}: 通知 {} 个监听器", self.name(), listeners.len());
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// 用户设置
#[derive(Clone)]
pub struct UserSettings {
    store: Rc<dyn KeyValueStore>,
    events: SettingsEvents,
}

impl UserSettings {
    pub fn new(store: Rc<dyn KeyValueStore>, events: SettingsEvents) -> Self {
        Self { store, events }
    }

    pub fn events(&self) -> &SettingsEvents {
        &self.events
    }

    /// 当前界面语言
    pub fn language(&self) -> String {
        let stored = self
            .store
            .get_item(constants::LANGUAGE_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|lang| !lang.trim().is_empty());

        stored
            .or_else(system_language)
            .unwrap_or_else(|| constants::FALLBACK_LANGUAGE.to_string())
    }

    /// 保存语言偏好并广播变更；存储失败只记录日志
    pub fn update_language(&self, language: &str) {
        if let Err(e) = self.store.set_item(constants::LANGUAGE_STORAGE_KEY, language) {
            tracing::debug!("保存语言偏好失败: {}", e);
        }
        self.events.emit();
    }
}

/// 从 `LC_ALL`、`LC_MESSAGES`、`LANG` 读取系统语言
pub fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find_map(|value| normalize_locale(&value))
}

/// `es_ES.UTF-8` → `es-ES`；`C`、`POSIX` 和空值视为未设置
pub fn normalize_locale(locale: &str) -> Option<String> {
    let base = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }

    Some(base.replace('_', "-"))
}
