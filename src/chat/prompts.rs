//! Quick prompts and the offline demo reply
//!
//! Quick prompts are the suggestions shown while the chat log is empty.
//! Selection is deterministic: up to [`RESERVED_SLOTS`] prompts matched from
//! the detected issues (in detection order) and then the skin type, followed
//! by the language's default list, without duplicates, capped at
//! [`MAX_PROMPTS`].

use crate::chat::ExpertInfo;
use crate::language::Language;
use crate::profile::{SkinAnalysis, SkinIssue};

/// Most prompts ever shown
pub const MAX_PROMPTS: usize = 3;

/// Leading slots available to issue and skin-type matches
pub const RESERVED_SLOTS: usize = 2;

type PromptRow = [&'static str; 3];

fn localized(row: &'static [PromptRow], language: Language) -> impl Iterator<Item = &'static str> {
    let column = match language {
        Language::Ko => 0,
        Language::En => 1,
        Language::Ja => 2,
    };
    row.iter().map(move |r| r[column])
}

const DEFAULT_PROMPTS: &[PromptRow] = &[
    [
        "제 피부에 맞는 스킨케어 루틴을 추천해주세요",
        "Recommend a skincare routine for my skin",
        "私の肌に合うスキンケアルーティンを教えてください",
    ],
    [
        "K-뷰티 입문자를 위한 기초 제품은?",
        "Best K-Beauty starter products?",
        "K-ビューティー初心者におすすめの基礎製品は？",
    ],
    [
        "피부 고민에 맞는 성분을 알려주세요",
        "Which ingredients suit my skin concerns?",
        "肌の悩みに合う成分を教えてください",
    ],
];

const DRYNESS_PROMPTS: &[PromptRow] = &[
    [
        "건조한 피부에 좋은 수분 크림 추천해주세요",
        "Recommend a hydrating cream for dry skin",
        "乾燥肌におすすめの保湿クリームを教えてください",
    ],
    [
        "피부 장벽 강화하는 방법이 궁금해요",
        "How to strengthen my skin barrier?",
        "肌のバリア機能を強化する方法は？",
    ],
];

const OILINESS_PROMPTS: &[PromptRow] = &[
    [
        "번들거림을 잡아주는 데일리 루틴이 궁금해요",
        "Daily routine to control shine?",
        "テカリを抑えるデイリールーティンは？",
    ],
    [
        "지성 피부용 가벼운 보습제를 추천해주세요",
        "Lightweight moisturizer for oily skin?",
        "脂性肌向けの軽い保湿剤を教えてください",
    ],
];

const ACNE_PROMPTS: &[PromptRow] = &[
    [
        "트러블 진정에 좋은 성분이 뭐예요?",
        "Which ingredients calm breakouts?",
        "ニキビを鎮める成分は？",
    ],
    [
        "여드름 자국 관리 방법을 알려주세요",
        "How do I fade acne marks?",
        "ニキビ跡のケア方法を教えてください",
    ],
];

const SENSITIVITY_PROMPTS: &[PromptRow] = &[
    [
        "민감한 피부에 자극 없는 제품 추천해주세요",
        "Gentle products for sensitive skin?",
        "敏感肌に優しい製品を教えてください",
    ],
    [
        "피부가 붉어질 때 어떻게 진정시키나요?",
        "How to calm redness quickly?",
        "赤みを素早く鎮める方法は？",
    ],
];

const DARK_CIRCLE_PROMPTS: &[PromptRow] = &[[
    "다크서클 완화에 좋은 아이크림은?",
    "Best eye cream for dark circles?",
    "クマに効くアイクリームは？",
]];

const OILY_TYPE_PROMPTS: &[PromptRow] = &[[
    "지성 피부를 위한 클렌징 순서가 궁금해요",
    "Cleansing steps for oily skin?",
    "脂性肌のためのクレンジング手順は？",
]];

const DRY_TYPE_PROMPTS: &[PromptRow] = &[[
    "건성 피부를 위한 레이어링 방법은?",
    "How should I layer products for dry skin?",
    "乾燥肌のレイヤリング方法は？",
]];

const COMBINATION_TYPE_PROMPTS: &[PromptRow] = &[[
    "복합성 피부는 T존과 U존을 어떻게 관리하나요?",
    "How to care for T-zone and U-zone in combination skin?",
    "混合肌のTゾーンとUゾーンのケア方法は？",
]];

const SENSITIVE_TYPE_PROMPTS: &[PromptRow] = &[[
    "민감성 피부를 위한 최소한의 루틴은?",
    "Minimal routine for sensitive skin?",
    "敏感肌のためのミニマルルーティンは？",
]];

fn issue_prompts(issue: SkinIssue) -> Option<&'static [PromptRow]> {
    match issue {
        SkinIssue::Dryness => Some(DRYNESS_PROMPTS),
        SkinIssue::Oiliness => Some(OILINESS_PROMPTS),
        SkinIssue::Acne => Some(ACNE_PROMPTS),
        SkinIssue::Sensitivity => Some(SENSITIVITY_PROMPTS),
        SkinIssue::DarkCircle => Some(DARK_CIRCLE_PROMPTS),
        _ => None,
    }
}

fn skin_type_prompts(skin_type: &str) -> Option<&'static [PromptRow]> {
    match skin_type.trim().to_lowercase().as_str() {
        "oily" => Some(OILY_TYPE_PROMPTS),
        "dry" => Some(DRY_TYPE_PROMPTS),
        "combination" => Some(COMBINATION_TYPE_PROMPTS),
        "sensitive" => Some(SENSITIVE_TYPE_PROMPTS),
        _ => None,
    }
}

/// Suggestions for an empty chat log
///
/// # Examples
///
/// ```
/// use sil_consult::chat::prompts::quick_prompts;
/// use sil_consult::language::Language;
///
/// let prompts = quick_prompts(None, Language::En);
/// assert_eq!(prompts[0], "Recommend a skincare routine for my skin");
/// assert_eq!(prompts.len(), 3);
/// ```
pub fn quick_prompts(skin: Option<&SkinAnalysis>, language: Language) -> Vec<String> {
    let mut matched: Vec<&'static str> = Vec::new();
    if let Some(skin) = skin {
        for table in skin.issues.iter().filter_map(|i| issue_prompts(*i)) {
            matched.extend(localized(table, language));
        }
        if let Some(table) = skin.skin_type.as_deref().and_then(skin_type_prompts) {
            matched.extend(localized(table, language));
        }
    }

    let mut prompts: Vec<String> = Vec::with_capacity(MAX_PROMPTS);
    for prompt in matched {
        if prompts.len() >= RESERVED_SLOTS {
            break;
        }
        if !prompts.iter().any(|p| p == prompt) {
            prompts.push(prompt.to_string());
        }
    }
    for prompt in localized(DEFAULT_PROMPTS, language) {
        if prompts.len() >= MAX_PROMPTS {
            break;
        }
        if !prompts.iter().any(|p| p == prompt) {
            prompts.push(prompt.to_string());
        }
    }
    prompts
}

/// Reply shown when neither the stream nor the plain consult call worked
pub fn demo_response(expert: &ExpertInfo, language: Language) -> String {
    match language {
        Language::Ko => format!(
            "안녕하세요! **{}**이에요. 현재 SIL 백엔드에 연결할 수 없어서 데모 응답을 보여드리고 있어요.\n\n\
             실제 버전에서는 5-Vector 분석 결과를 기반으로 맞춤형 K-뷰티 상담을 제공합니다. 🌸",
            expert.name
        ),
        Language::Ja => format!(
            "こんにちは！**{}**です。現在SILバックエンドに接続できないため、デモ応答を表示しています。\n\n\
             実際のバージョンでは、5-Vector分析に基づくパーソナライズされたK-ビューティー相談を提供します。🌸",
            expert.name
        ),
        Language::En => format!(
            "Hi! I'm **{}**. Currently unable to connect to the SIL backend, so showing a demo response.\n\n\
             In the full version, this provides personalized K-Beauty consultation based on your 5-Vector analysis. 🌸",
            expert.name
        ),
    }
}
