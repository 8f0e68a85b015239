//! User-facing error text in the interface language.
//!
//! The taxonomy in [`SolveError`] is for programs; these strings are for
//! the person holding the camera. Messages name the action the user can
//! actually take (fix the key, wait, check the proxy URL).

use tutorlens_llm::LlmError;

use crate::prompt::Language;
use crate::solver::SolveError;

/// Renders a [`SolveError`] as an actionable message in `lang`.
#[must_use]
pub fn user_message(err: &SolveError, lang: Language) -> String {
    match err {
        SolveError::MissingApiKey => match lang {
            Language::En => {
                "API Key not configured. Please set API_KEY in your environment variables.".into()
            }
            Language::Zh => "系统未配置 API Key。请在环境变量中设置 API_KEY。".into(),
        },
        SolveError::Normalize(_) => match lang {
            Language::En => "Invalid JSON response from AI.".into(),
            Language::Zh => "AI 返回数据格式错误。".into(),
        },
        SolveError::Llm(llm) => llm_message(llm, lang),
    }
}

fn llm_message(err: &LlmError, lang: Language) -> String {
    if err.is_network() {
        return match lang {
            Language::En => {
                "Network error. Please check your connection, proxy settings, or API_BASE_URL."
                    .into()
            }
            Language::Zh => "网络连接失败。请检查网络、代理设置或 API_BASE_URL 配置。".into(),
        };
    }
    match err {
        LlmError::Auth => match lang {
            Language::En => "API Key is invalid. Please check your configuration.".into(),
            Language::Zh => "API Key 无效，请检查配置。".into(),
        },
        LlmError::QuotaExceeded => match lang {
            Language::En => "API quota exceeded. Please wait a moment and try again.".into(),
            Language::Zh => "API 调用额度已用尽，请稍后再试。".into(),
        },
        LlmError::ModelNotFound { model } => match lang {
            Language::En => format!("Model {model} is not available. Please try again later."),
            Language::Zh => format!("模型 {model} 当前不可用，请稍后再试。"),
        },
        LlmError::Json(_) => match lang {
            Language::En => "Invalid JSON response from AI.".into(),
            Language::Zh => "AI 返回数据格式错误。".into(),
        },
        other => match lang {
            Language::En => format!("Request failed: {other}"),
            Language::Zh => format!("请求失败：{other}"),
        },
    }
}
