//! Consultation language and terminal UI strings
//!
//! The backend replies in the language sent with each consult request;
//! this module also carries the handful of labels the terminal front end
//! prints, keyed the same way for all three languages.

use crate::error::SilError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target language for replies and prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean
    #[default]
    Ko,
    /// English
    En,
    /// Japanese
    Ja,
}

impl Language {
    /// Wire code (`ko`, `en`, `ja`)
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    /// Look up a UI label; unknown keys echo the key back
    pub fn t(&self, key: &'static str) -> &'static str {
        UI_STRINGS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, [ko, en, ja])| match self {
                Language::Ko => *ko,
                Language::En => *en,
                Language::Ja => *ja,
            })
            .unwrap_or(key)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = SilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" => Ok(Language::Ko),
            "en" => Ok(Language::En),
            "ja" => Ok(Language::Ja),
            other => Err(SilError::Validation(format!(
                "Unsupported language: {}. Must be one of: ko, en, ja",
                other
            ))),
        }
    }
}

const UI_STRINGS: &[(&str, [&str; 3])] = &[
    (
        "welcome_title",
        ["AI 피부 상담", "AI Skin Consultation", "AI 肌相談"],
    ),
    (
        "welcome_desc",
        [
            "5-Vector를 설정하면 가장 맞춤화된 상담을 받을 수 있어요. 바로 채팅을 시작할 수도 있습니다.",
            "Set up your 5 vectors for the most personalized experience, or jump straight into chatting.",
            "5-Vectorを設定すると最もパーソナライズされた相談ができます。チャットにすぐ入ることもできます。",
        ],
    ),
    (
        "welcome_start",
        ["5-Vector 설정 시작", "Start 5-Vector Setup", "5-Vector設定開始"],
    ),
    ("welcome_skip", ["바로 채팅하기", "Skip to Chat", "チャットへ"]),
    ("step_persona", ["상담사", "Advisor", "アドバイザー"]),
    ("step_skin_scan", ["피부분석", "Skin Scan", "肌分析"]),
    ("step_environment", ["환경", "Environment", "環境"]),
    ("step_lifestyle", ["생활습관", "Lifestyle", "生活習慣"]),
    ("step_tpo", ["TPO", "TPO", "TPO"]),
    ("step_theme", ["테마", "Theme", "テーマ"]),
    ("skip_all", ["모두 건너뛰기", "Skip all", "すべてスキップ"]),
    (
        "skin_analyzing",
        [
            "Claude Vision으로 분석 중...",
            "Analyzing with Claude Vision...",
            "Claude Visionで分析中...",
        ],
    ),
    ("skin_complete", ["분석 완료!", "Analysis Complete!", "分析完了！"]),
    (
        "skin_fallback",
        [
            "분석 서버에 연결할 수 없어 기본값을 사용합니다",
            "Analyzer unavailable, using fallback values",
            "分析サーバーに接続できないため既定値を使用します",
        ],
    ),
    ("env_detect", ["내 위치 감지", "Detect My Location", "現在地を検出"]),
    ("env_or_select", ["또는 도시 선택", "Or select a city", "または都市を選択"]),
    (
        "chat_placeholder",
        [
            "피부 고민을 물어보세요...",
            "Ask your K-Beauty expert...",
            "肌の悩みを聞いてください...",
        ],
    ),
    (
        "chat_disclaimer",
        [
            "SIL AI는 실수할 수 있어요. 의학적 조언은 피부과 전문의와 상담하세요.",
            "SIL AI can make mistakes. Consult a dermatologist for medical advice.",
            "SIL AIは間違えることがあります。医学的なアドバイスは皮膚科医にご相談ください。",
        ],
    ),
];
