//! Security+ 用語集の変換
//!
//! `English Term (ABBR)（日本語）: 定義` 形式の行を解析し、
//! 略称・カテゴリ・優先度・実務例を付けたカードデータにする。

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 用語TSVのヘッダー
pub const TERM_TSV_HEADERS: [&str; 7] = [
    "Front",
    "Japanese",
    "English_Full",
    "Definition",
    "Practical_Example",
    "Category",
    "Priority",
];

/// 分類できなかった用語のカテゴリ
pub const GENERAL_CATEGORY: &str = "general";

lazy_static! {
    static ref JAPANESE_PART_RE: Regex = Regex::new(r"（(.+?)）").unwrap();
    static ref PAREN_ABBR_RE: Regex = Regex::new(r"\(([A-Z]+[A-Za-z0-9]*)\)").unwrap();
    static ref LEADING_ABBR_RE: Regex = Regex::new(r"^([A-Z]{2,})").unwrap();
    static ref CAPITALIZED_WORD_RE: Regex = Regex::new(r"\b[A-Z][a-z]*").unwrap();
}

/// カテゴリ → キーワード（上から順に判定）
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "cryptography",
        &[
            "暗号化", "復号化", "ハッシュ関数", "デジタル署名", "PKI", "SSL/TLS", "量子暗号",
            "ポストクォンタム暗号", "同形暗号", "暗号アジリティ", "ゼロ知識証明", "差分プライバシー",
        ],
    ),
    (
        "network_security",
        &["VPN", "ファイアウォール", "IDS", "IPS", "中間者攻撃", "DDoS攻撃", "IoTセキュリティ"],
    ),
    (
        "access_control",
        &[
            "認証", "認可", "アカウンタビリティ", "多要素認証", "シングルサインオン", "LDAP", "RBAC",
            "ACL", "CIA",
        ],
    ),
    (
        "threats_attacks",
        &[
            "ソーシャルエンジニアリング", "フィッシング", "スピアフィッシング", "マルウェア",
            "ランサムウェア", "トロイの木馬", "ルートキット", "ボットネット", "SQLインジェクション",
            "XSS", "CSRF", "バッファオーバーフロー", "特権昇格", "APT", "ゼロデイ攻撃",
        ],
    ),
    (
        "risk_compliance",
        &[
            "リスクアセスメント", "コンプライアンス", "GDPR", "HIPAA", "PCI DSS", "ISO 27001", "NIST",
            "セキュリティガバナンス", "セキュリティポリシー", "リスクレジスタ", "KRI", "KPI",
        ],
    ),
    (
        "incident_response",
        &[
            "インシデント対応", "災害復旧", "事業継続計画", "SOC", "SIEM", "SOAR",
            "脅威インテリジェンス", "CTI", "IOC", "TTPs",
        ],
    ),
    (
        "security_testing",
        &[
            "脆弱性スキャン", "ペネトレーションテスト", "レッドチーム", "ブルーチーム",
            "パープルチーム", "ハニーポット", "サンドボックス",
        ],
    ),
    (
        "data_privacy",
        &[
            "データ損失防止", "データガバナンス", "データプライバシー", "プライバシー影響評価",
            "データ保護影響評価", "忘れられる権利", "データポータビリティ", "データ最小化",
            "データ匿名化", "データ仮名化",
        ],
    ),
    (
        "emerging_tech",
        &[
            "クラウドセキュリティ", "DevSecOps", "セキュリティバイデザイン", "プライベート情報検索",
            "フェデレーテッドラーニング", "秘密計算",
        ],
    ),
];

/// 略称ごとの実務例
const ABBREVIATION_EXAMPLES: &[(&str, &str)] = &[
    ("PKI", "デジタル証明書の発行・管理、WebサーバーのSSL証明書"),
    ("VPN", "リモートワーク時の安全な企業ネットワーク接続"),
    ("MFA", "銀行ATM（カード＋PIN）、クラウドサービス（パスワード＋SMS）"),
    ("ACL", "ルーター設定、ファイルサーバーのアクセス権限"),
    ("IDS", "ネットワーク監視、不正侵入の検知・ログ記録"),
    ("DDoS攻撃", "ボットネットによる大量アクセスでサーバーダウン"),
    ("SIEM", "セキュリティログの収集・分析・可視化プラットフォーム"),
    ("GDPR", "EU居住者の個人データ処理に関する同意取得・削除権"),
];

/// カテゴリごとの実務例
const CATEGORY_EXAMPLES: &[(&str, &str)] = &[
    ("cryptography", "暗号化通信、データ保護、認証システム"),
    ("network_security", "ファイアウォール設定、トラフィック監視"),
    ("access_control", "ユーザー権限管理、認証システム"),
    ("threats_attacks", "サイバー攻撃の手法、セキュリティ対策"),
    ("risk_compliance", "規制遵守、リスク管理プロセス"),
    ("incident_response", "セキュリティインシデント対応手順"),
    ("security_testing", "セキュリティ評価、脆弱性検査"),
    ("data_privacy", "個人情報保護、プライバシー対策"),
    ("emerging_tech", "最新技術、将来のセキュリティ"),
];

const DEFAULT_EXAMPLE: &str = "セキュリティ関連技術・概念";

/// 学習優先度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
        }
    }
}

/// 用語1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityTerm {
    pub abbreviation: String,
    pub english_term: String,
    pub japanese_term: String,
    pub definition: String,
    pub category: String,
    pub priority: Priority,
    pub practical_example: String,
}

impl SecurityTerm {
    /// TSVの1行分（`TERM_TSV_HEADERS` の順）
    pub fn to_record(&self) -> [String; 7] {
        [
            self.abbreviation.clone(),
            self.japanese_term.clone(),
            self.english_term.clone(),
            self.definition.clone(),
            self.practical_example.clone(),
            self.category.clone(),
            self.priority.to_string(),
        ]
    }
}

/// 用語集の解析結果
#[derive(Debug, Clone, Default)]
pub struct TermParseReport {
    pub terms: Vec<SecurityTerm>,
    /// 解析できなかった行
    pub skipped: Vec<String>,
}

impl TermParseReport {
    /// 対象行数（見出し・空行を除く）
    pub fn total(&self) -> usize {
        self.terms.len() + self.skipped.len()
    }

    /// カテゴリ別件数（カテゴリ名順）
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for term in &self.terms {
            *counts.entry(term.category.clone()).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}

/// 英語名から略称を取り出す
///
/// `(ABBR)` → 先頭の大文字連続 → 大文字始まりの語の頭文字（2語以上、最大3語）→ そのまま。
pub fn extract_abbreviation(english_term: &str) -> String {
    if let Some(caps) = PAREN_ABBR_RE.captures(english_term) {
        return caps[1].to_string();
    }
    if let Some(caps) = LEADING_ABBR_RE.captures(english_term) {
        return caps[1].to_string();
    }

    let words: Vec<&str> = CAPITALIZED_WORD_RE
        .find_iter(english_term)
        .map(|m| m.as_str())
        .collect();
    if words.len() >= 2 {
        return words.iter().take(3).filter_map(|w| w.chars().next()).collect();
    }

    english_term.to_string()
}

/// カテゴリ判定
pub fn categorize(term_raw: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| term_raw.contains(k)))
        .map(|(name, _)| *name)
        .unwrap_or(GENERAL_CATEGORY)
}

/// 実務例
pub fn practical_example(abbreviation: &str, category: &str) -> &'static str {
    ABBREVIATION_EXAMPLES
        .iter()
        .find(|(abbr, _)| *abbr == abbreviation)
        .or_else(|| CATEGORY_EXAMPLES.iter().find(|(cat, _)| *cat == category))
        .map(|(_, example)| *example)
        .unwrap_or(DEFAULT_EXAMPLE)
}

/// 用語行を解析
pub fn parse_term_line(line: &str) -> Option<SecurityTerm> {
    let (term_raw, definition) = line.split_once(':').or_else(|| line.split_once('：'))?;
    let term_raw = term_raw.trim();
    let definition = definition.trim();
    if term_raw.is_empty() {
        return None;
    }

    let (english_term, japanese_term) = match JAPANESE_PART_RE.captures(term_raw) {
        Some(caps) => (
            term_raw.replace(&caps[0], "").trim().to_string(),
            caps[1].to_string(),
        ),
        None => (term_raw.to_string(), term_raw.to_string()),
    };

    let abbreviation = extract_abbreviation(&english_term);
    let category = categorize(term_raw);
    let priority = if abbreviation != english_term {
        Priority::High
    } else {
        Priority::Medium
    };

    Some(SecurityTerm {
        practical_example: practical_example(&abbreviation, category).to_string(),
        abbreviation,
        english_term,
        japanese_term,
        definition: definition.to_string(),
        category: category.to_string(),
        priority,
    })
}

/// 用語集全体を解析（`Security+` で始まる見出し行と空行は対象外）
pub fn parse_terms(text: &str) -> TermParseReport {
    let mut report = TermParseReport::default();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("Security+") {
            continue;
        }
        match parse_term_line(line) {
            Some(term) => report.terms.push(term),
            None => report.skipped.push(line.to_string()),
        }
    }
    report
}

/// 優先度 → カテゴリ → 略称の順に並べる
pub fn sort_terms(terms: &mut [SecurityTerm]) {
    terms.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.abbreviation.cmp(&b.abbreviation))
    });
}
