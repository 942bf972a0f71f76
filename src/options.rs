//! The closed categorical vocabularies the rest of the app compares against.
//!
//! These lists are defined by the training staff, not by the code; equality
//! checks elsewhere must use these constants verbatim.

pub const TIME_LOSS_NONE: &str = "NON TIME LOSS";
pub const TIME_LOSS_NEW_INJURY: &str = "NEW/RE-INJURY";
pub const TIME_LOSS_LOSS: &str = "TIME LOSS";
pub const TIME_LOSS_RETURN: &str = "RETURN TO PLAY";

pub const TIME_LOSS_OPTIONS: [&str; 4] = [
    TIME_LOSS_NONE,
    TIME_LOSS_NEW_INJURY,
    TIME_LOSS_LOSS,
    TIME_LOSS_RETURN,
];

pub const STATUS_IN: &str = "IN";
pub const STATUS_RESTRICTION: &str = "RESTRICTION";
pub const STATUS_OUT: &str = "OUT";
pub const STATUS_GTD: &str = "GTD";

pub const PARTICIPATION_STATUS_OPTIONS: [&str; 4] =
    [STATUS_IN, STATUS_RESTRICTION, STATUS_OUT, STATUS_GTD];

/// Search-filter sentinels. These are filter values, not stored categories.
pub const FILTER_ALL: &str = "ALL";
pub const FILTER_TIME_LOSS_ONLY: &str = "TIME_LOSS_ONLY";

pub struct Pulldown {
    pub field: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

pub const ACTIVITY_OPTIONS: [&str; 2] = ["試合", "練習"];

pub const TIMING_OPTIONS: [&str; 12] = [
    "1Q",
    "2Q",
    "3Q",
    "4Q",
    "walkthrough",
    "indy",
    "kick",
    "team",
    "scrimage",
    "strength training",
    "after training",
    "その他",
];

pub const AGE_OPTIONS: [&str; 26] = [
    "20", "21", "22", "23", "24", "25", "26", "27", "28", "29", "30", "31", "32", "33", "34", "35",
    "36", "37", "38", "39", "40", "41", "42", "43", "44", "45",
];

pub const STATUS_TAG_OPTIONS: [&str; 3] = ["新規", "再発", "悪化"];

pub const MECHANISM_OPTIONS: [&str; 6] = [
    "直達外力衝突",
    "介達外力衝突",
    "地面衝突",
    "ボール衝突",
    "非接触",
    "その他",
];

pub const INJURY_TYPE_OPTIONS: [&str; 29] = [
    "脳振盪/脳損傷",
    "脊髄損傷",
    "末梢神経損傷",
    "脱臼/亜脱臼",
    "骨折",
    "疲労性骨損傷",
    "骨挫傷",
    "無腐性壊死",
    "成長軟骨板損傷",
    "軟骨損傷（半月板含む）",
    "関節捻挫/靭帯損傷",
    "慢性の不安定症",
    "腱断裂",
    "腱障害",
    "筋痙攣",
    "肉離れ/筋損傷",
    "筋打撲傷",
    "筋コンパートメント症候群",
    "裂傷",
    "擦過傷",
    "打撲傷（表在性）",
    "関節炎",
    "滑液包炎",
    "滑膜炎",
    "血管損傷",
    "断端損傷",
    "内部臓器損傷",
    "その他",
    "不明/特定不能",
];

pub const INJURY_SITE_OPTIONS: [&str; 22] = [
    "頭部",
    "顔面",
    "歯/口腔/顎",
    "頚部/頚椎",
    "肩",
    "上腕",
    "肘",
    "前腕",
    "手関節",
    "手",
    "胸部",
    "胸椎/上背部",
    "腰（仙椎/臀部含む）",
    "腹部",
    "股関節/鼠径部",
    "大腿前面",
    "大腿後面",
    "膝",
    "下腿/アキレス腱",
    "足関節",
    "足部",
    "不明/該当なし",
];

pub const POSITION_OPTIONS: [&str; 13] = [
    "QB", "OL", "WR", "RB", "TE", "DL", "LB", "CB", "SF", "NI", "K", "S", "その他",
];

pub const ONSET_STYLE_OPTIONS: [&str; 3] =
    ["Acute sudden", "Repetitive sudden", "Repetitive gradual"];

pub const PULLDOWNS: [Pulldown; 9] = [
    Pulldown {
        field: "activity",
        label: "試合/練習",
        options: &ACTIVITY_OPTIONS,
    },
    Pulldown {
        field: "timing",
        label: "タイミング",
        options: &TIMING_OPTIONS,
    },
    Pulldown {
        field: "age",
        label: "年齢",
        options: &AGE_OPTIONS,
    },
    Pulldown {
        field: "status",
        label: "状態",
        options: &STATUS_TAG_OPTIONS,
    },
    Pulldown {
        field: "mechanism",
        label: "外力",
        options: &MECHANISM_OPTIONS,
    },
    Pulldown {
        field: "injury_type",
        label: "傷害の種類",
        options: &INJURY_TYPE_OPTIONS,
    },
    Pulldown {
        field: "injury_site",
        label: "傷害の部位",
        options: &INJURY_SITE_OPTIONS,
    },
    Pulldown {
        field: "position",
        label: "ポジション",
        options: &POSITION_OPTIONS,
    },
    Pulldown {
        field: "onset_style",
        label: "発祥様式",
        options: &ONSET_STYLE_OPTIONS,
    },
];
