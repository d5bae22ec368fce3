//! Instruction prompts for label reading.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — retuning the extraction behaviour (new
//!    field hints, digit-confusion warnings) means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real vision model, so prompt regressions are easy to catch.
//!
//! Callers override the default via
//! [`crate::config::ExtractionConfig::instruction`]; the constant here is
//! used only when no override is provided. The prompt is written in Japanese
//! because the labels are Japanese and the field hints (prefecture names,
//! JAN prefixes) only make sense in that domain.

/// Default instruction for reading a produce label into the four-field record.
///
/// Asks for strict JSON with English keys and explicit `null` for anything
/// not found, and warns about the digit pairs most often confused on printed
/// labels. Used when `ExtractionConfig::instruction` is `None`.
pub const DEFAULT_INSTRUCTION: &str = r#"あなたは日本の農産物加工場で使用される、商品マスタ登録用のラベル読み取りに特化したOCRの専門家です。
添付された画像から、以下の4つの情報を正確に抽出してください。

1. productName (商品名): 必ず野菜か果物の名前です。例えば「カットキャベツ」や「冷凍ブロッコリー」などです。
2. origin (産地): 必ず日本の都道府県名です。例えば「茨城県産」や「静岡県」などです。
3. mngId (管理番号): 「管理番号」やそれに類する項目と共に記載される3桁または4桁の識別子。JANコードや電話番号と混同しないでください。
4. janCode (JANコード): 45または49から始まる13桁、または8桁のJANコードです。バーコードの下の数字を正確に読み取ってください。

注意事項:
- ラベルは稀に手書きの場合もありますが、基本的には印字されています。
- 数字の「3」と「8」、「0」と「9」、「1」と「7」は特に間違いやすいので注意深く読み取ってください。
- 該当する情報が見つからない項目は、必ず null を返してください。
- 回答は必ず以下のJSON形式のみで、キーは英語のまま返してください。余計な説明は不要です。

{
  "productName": "抽出した商品名",
  "origin": "抽出した産地",
  "mngId": "抽出した管理番号",
  "janCode": "抽出したJANコード"
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instruction_names_all_four_keys() {
        for key in ["productName", "origin", "mngId", "janCode"] {
            assert!(
                DEFAULT_INSTRUCTION.contains(key),
                "prompt is missing key {key}"
            );
        }
    }

    #[test]
    fn default_instruction_demands_null_for_missing_fields() {
        assert!(DEFAULT_INSTRUCTION.contains("null"));
    }
}
