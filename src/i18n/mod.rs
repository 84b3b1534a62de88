//! 国际化模块
//!
//! 提供多语言消息支持，目前支持英文和中文

pub mod en;
pub mod messages;
pub mod zh;

/// 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// 英文（默认）
    #[default]
    En,
    /// 中文
    Zh,
}

impl Locale {
    /// 从 `--lang` 参数解析语言，无法识别时回退到英文
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "zh" | "cn" | "chinese" | "zh_cn" | "zh-cn" => Locale::Zh,
            _ => Locale::En,
        }
    }
}

/// 获取指定语言的消息
pub fn get_message(key: &str, locale: Locale) -> &'static str {
    match locale {
        Locale::En => en::get(key),
        Locale::Zh => zh::get(key),
    }
}

/// 获取带参数的消息（使用 {} 占位符）
pub fn format_message(key: &str, locale: Locale, args: &[&str]) -> String {
    let mut msg = get_message(key, locale).to_string();
    let mut from = 0;
    for arg in args {
        if let Some(pos) = msg[from..].find("{}") {
            let pos = from + pos;
            msg.replace_range(pos..pos + 2, arg);
            // 参数本身可能含有 "{}"，从替换后的位置继续查找
            from = pos + arg.len();
        }
    }
    msg
}
