use std::collections::HashMap;

use novelist_core::ValueMap;
use novelist_prompt::{format_bullets, format_entries, PromptTemplate, EMPTY_SENTINEL};
use serde_json::json;

#[test]
fn renders_template_with_vars() {
    let tmpl = PromptTemplate::new("【用户需求】\n{{user_input}}");
    let vars = HashMap::from([("user_input", "写一段打斗场景".to_string())]);
    assert_eq!(tmpl.render(&vars).unwrap(), "【用户需求】\n写一段打斗场景");
}

#[test]
fn does_not_confuse_overlapping_keys() {
    let tmpl = PromptTemplate::new("{{name}} {{fullname}}");
    let vars = HashMap::from([("name", "X".to_string()), ("fullname", "Y".to_string())]);
    assert_eq!(tmpl.render(&vars).unwrap(), "X Y");
}

#[test]
fn leaves_single_braces_and_values_untouched() {
    let tmpl = PromptTemplate::new("返回JSON：{ \"task_type\": ... } {{ input }}");
    let vars = HashMap::from([("input", "{{input}}".to_string())]);
    assert_eq!(
        tmpl.render(&vars).unwrap(),
        "返回JSON：{ \"task_type\": ... } {{input}}"
    );
}

#[test]
fn missing_variables_render_empty() {
    let tmpl = PromptTemplate::new("a{{missing}}b");
    assert_eq!(tmpl.render(&HashMap::new()).unwrap(), "ab");
}

#[test]
fn lists_variables_once_in_order() {
    let tmpl = PromptTemplate::new("{{b}} {{a}} {{b}}");
    assert_eq!(tmpl.variables(), vec!["b", "a"]);
}

#[test]
fn bullets_use_sentinel_when_empty() {
    assert_eq!(format_bullets(Vec::<String>::new()), EMPTY_SENTINEL);
    assert_eq!(format_bullets(["火系", "冰系"]), "- 火系\n- 冰系");
}

#[test]
fn entries_keep_insertion_order() {
    let mut settings = ValueMap::new();
    settings.insert("主角绝招".to_string(), json!("烈焰斩"));
    settings.insert("等级".to_string(), json!(7));
    assert_eq!(format_entries(&settings), "- 主角绝招: 烈焰斩\n- 等级: 7");
    assert_eq!(format_entries(&ValueMap::new()), EMPTY_SENTINEL);
}
