//! # 运行时绑定脚本生成器
//!
//! 将分组仓库快照编译为一组绑定描述，再渲染为可注入宿主文档的脚本与样式。
//!
//! ## 编译阶段
//! 生成器运行在宿主文档渲染之前，无法访问实时 UI 树。
//! 对每个"已分组且当前打开"的文件输出一条 `BindingDescriptor`：
//! - 完整路径标签（主目录前缀折叠为短别名，减少跨安装环境的差异）
//! - 仅含基础文件名的兜底标签
//!
//! ## 渲染阶段
//! 脚本正文是固定的解释程序，描述列表序列化为 JSON 后整体嵌入，
//! 不再为每个文件生成独立函数，也就不存在字符串拼接带来的转义问题。
//!
//! ## 运行时行为
//! 1. 等待第一批标签页元素出现（一次性信号），为所有标签页加圆角端帽
//! 2. 持续订阅标签栏的增删变化，每次变化都重新装饰并重新绑定
//! 3. 对每条描述使用同一个匹配例程：先按完整路径标签匹配，再按基础名兜底；
//!    匹配成功后写入分组属性和颜色变量，并重建分组小标签（重建可避免重复）
//!
//! 两个已分组文件基础名相同时，兜底匹配可能绑定错误的标签页，这是已知限制。

use std::collections::HashSet;

use crate::models::binding::{BindingDescriptor, RenderedBundle};
use crate::models::config::EngineConfig;
use crate::models::group::GroupSnapshot;
use crate::utils::path;

/// 脚本中描述列表的占位符
const BINDINGS_PLACEHOLDER: &str = "/*__TAB_GROUPS_BINDINGS__*/[]";

/// 运行时解释程序
const RUNTIME_SCRIPT: &str = r#"(function () {
  'use strict';

  const BINDINGS = /*__TAB_GROUPS_BINDINGS__*/[];
  const STRIP_SELECTOR = '.tabs-container';
  const TAB_SELECTOR = '.tabs-container .tab';
  const ROUNDED_CLASS = 'tab-groups-rounded';
  const CHIP_CLASS = 'tab-groups-chip';
  const GROUP_ATTR = 'data-tab-group';
  const OBSERVE_OPTIONS = { childList: true, subtree: true };

  function currentTabs() {
    return Array.from(document.querySelectorAll(TAB_SELECTOR));
  }

  function firstTabs() {
    return new Promise(function (resolve) {
      const present = currentTabs();
      if (present.length > 0) {
        resolve(present);
        return;
      }
      const waiter = new MutationObserver(function () {
        const tabs = currentTabs();
        if (tabs.length > 0) {
          waiter.disconnect();
          resolve(tabs);
        }
      });
      waiter.observe(document.documentElement, OBSERVE_OPTIONS);
    });
  }

  function decorate(tabs) {
    tabs.forEach(function (tab) {
      tab.classList.add(ROUNDED_CLASS);
    });
  }

  function tabLabel(tab) {
    const titled = Array.from(tab.querySelectorAll('[title]')).map(function (el) {
      return el.getAttribute('title');
    });
    return [tab.getAttribute('title'), tab.getAttribute('aria-label')]
      .concat(titled)
      .filter(Boolean)
      .join('\n');
  }

  function tabName(tab) {
    const label = tab.querySelector('.label-name') || tab.querySelector('.monaco-icon-label');
    return ((label ? label.textContent : tab.textContent) || '').trim();
  }

  function findTab(tabs, binding) {
    return (
      tabs.find(function (tab) {
        return tabLabel(tab).indexOf(binding.pathLabel) !== -1;
      }) ||
      tabs.find(function (tab) {
        return tabName(tab) === binding.basenameFallback;
      }) ||
      null
    );
  }

  function clearBinding(tab) {
    tab.removeAttribute(GROUP_ATTR);
    tab.style.removeProperty('--tab-group-color');
    tab.style.removeProperty('--tab-group-order');
    tab.querySelectorAll('.' + CHIP_CLASS).forEach(function (chip) {
      chip.remove();
    });
  }

  function bind(tabs) {
    tabs.forEach(clearBinding);
    BINDINGS.forEach(function (binding) {
      const tab = findTab(tabs, binding);
      if (!tab) {
        return;
      }
      tab.setAttribute(GROUP_ATTR, binding.groupName);
      tab.style.setProperty('--tab-group-color', binding.color);
      tab.style.setProperty('--tab-group-order', String(binding.order + 1));
      const chip = document.createElement('span');
      chip.className = CHIP_CLASS;
      chip.textContent = binding.groupName;
      tab.appendChild(chip);
    });
  }

  function touchesTabs(record) {
    const target = record.target;
    if (target.nodeType === 1 && target.closest(STRIP_SELECTOR)) {
      return true;
    }
    return Array.from(record.addedNodes)
      .concat(Array.from(record.removedNodes))
      .some(function (node) {
        return (
          node.nodeType === 1 &&
          (node.classList.contains('tab') ||
            node.classList.contains('tabs-container') ||
            node.querySelector('.tab') !== null)
        );
      });
  }

  let observer = null;
  let pending = false;

  function root() {
    return document.body || document.documentElement;
  }

  function apply() {
    observer.disconnect();
    const tabs = currentTabs();
    decorate(tabs);
    bind(tabs);
    observer.observe(root(), OBSERVE_OPTIONS);
  }

  function schedule() {
    if (pending) {
      return;
    }
    pending = true;
    window.requestAnimationFrame(function () {
      pending = false;
      apply();
    });
  }

  firstTabs().then(function (tabs) {
    decorate(tabs);
    observer = new MutationObserver(function (records) {
      if (records.some(touchesTabs)) {
        schedule();
      }
    });
    apply();
  });
})();"#;

/// 运行时样式：圆角端帽、分组颜色条与分组小标签
const RUNTIME_STYLE: &str = r#".tabs-container .tab.tab-groups-rounded {
  border-radius: 8px 8px 0 0;
}
.tabs-container .tab[data-tab-group] {
  order: var(--tab-group-order);
  box-shadow: inset 0 2px 0 var(--tab-group-color);
}
.tabs-container .tab .tab-groups-chip {
  align-self: center;
  margin-left: 6px;
  padding: 0 6px;
  border-radius: 8px;
  font-size: 10px;
  line-height: 16px;
  white-space: nowrap;
  pointer-events: none;
  color: #e8e8e8;
  background-color: var(--tab-group-color);
}"#;

pub struct BindingScriptGenerator {
    home: Option<String>,
    home_alias: String,
}

impl BindingScriptGenerator {
    pub fn new(home: Option<String>, home_alias: impl Into<String>) -> Self {
        Self {
            home,
            home_alias: home_alias.into(),
        }
    }

    /// 使用当前用户主目录和配置中的别名
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(path::home_dir_string(), config.home_alias.clone())
    }

    /// 编译绑定描述
    ///
    /// # 参数
    /// - `groups` - 分组仓库快照
    /// - `open_paths` - 宿主当前打开的文件路径；`None` 表示宿主无法提供，视为全部打开
    pub fn compile(
        &self,
        groups: &GroupSnapshot,
        open_paths: Option<&HashSet<String>>,
    ) -> Vec<BindingDescriptor> {
        groups
            .iter()
            .enumerate()
            .flat_map(|(order, (name, group))| {
                group
                    .files
                    .iter()
                    .filter(move |file| open_paths.is_none_or(|open| open.contains(&file.path)))
                    .map(move |file| BindingDescriptor {
                        path_label: path::collapse_home(
                            &file.path,
                            self.home.as_deref(),
                            &self.home_alias,
                        ),
                        basename_fallback: path::basename(&file.path).to_string(),
                        group_name: name.clone(),
                        color: group.color.clone(),
                        order,
                    })
            })
            .collect()
    }

    /// 将绑定描述渲染为脚本与样式
    pub fn render(&self, descriptors: &[BindingDescriptor]) -> RenderedBundle {
        let json = serde_json::to_string(descriptors).unwrap_or_else(|e| {
            log::warn!("序列化绑定描述失败，使用空列表: {}", e);
            "[]".to_string()
        });
        // `</` 不能出现在内联脚本中，否则可能提前闭合 <script> 节点
        let json = json.replace("</", "<\\/");

        RenderedBundle {
            script: RUNTIME_SCRIPT.replacen(BINDINGS_PLACEHOLDER, &json, 1),
            style: RUNTIME_STYLE.to_string(),
        }
    }

    /// 编译并渲染
    pub fn generate(
        &self,
        groups: &GroupSnapshot,
        open_paths: Option<&HashSet<String>>,
    ) -> RenderedBundle {
        let descriptors = self.compile(groups, open_paths);
        log::debug!("生成 {} 条绑定描述", descriptors.len());
        self.render(&descriptors)
    }
}
