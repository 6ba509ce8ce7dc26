use std::collections::HashMap;

use novelist_core::NovelistError;
use novelist_prompt::{format_bullets, format_entries, PromptTemplate};

use crate::AgentState;

pub const SYSTEM_MESSAGE: &str = "你是一位专业的小说创作助手，擅长生成高质量的小说内容。
你必须严格遵守核心设定和锁定设定，保持与前文的连贯性。
生成的内容要符合人物性格，情节合理，文笔流畅。";

const INTENT_TEMPLATE: &str = r#"分析用户指令，判断任务类型和关键信息：

用户输入: {{user_input}}

返回JSON格式：
{
    "task_type": "generate/continue/summarize/check/edit/outline",
    "target": "chapter/scene/dialogue/description/character",
    "requirements": ["要求1", "要求2"],
    "style": "风格描述",
    "word_count": 目标字数
}

任务类型说明：
- generate: 生成新内容
- continue: 续写现有内容（断点续写）
- summarize: 生成总结
- check: 校验内容
- edit: 编辑修改
- outline: 生成大纲
"#;

const GENERATE_TEMPLATE: &str = "请根据以下信息生成小说内容：

【用户需求】
{{user_input}}

【核心设定】（必须严格遵守，不可违背）
{{core_knowledge}}

【前文脉络】
{{summaries}}

【锁定设定】（绝对不可更改）
{{locked_settings}}

生成要求：
1. 严格遵守核心设定和锁定设定
2. 保持与前文的连贯性和一致性
3. 人物行为符合已设定的性格
4. 情节推进合理，逻辑自洽
5. 文笔流畅，描写生动

请开始生成：
";

const CONTINUE_TEMPLATE: &str = "请续写以下小说内容：

【现有内容】（请从此处继续写）
{{existing_content}}

【用户需求】
{{user_input}}

【核心设定】（必须严格遵守，不可违背）
{{core_knowledge}}

【前文脉络】
{{summaries}}

【锁定设定】（绝对不可更改）
{{locked_settings}}

续写要求：
1. 严格遵守核心设定和锁定设定
2. 保持与现有内容的连贯性和一致性
3. 人物行为符合已设定的性格
4. 情节推进合理，逻辑自洽
5. 文笔流畅，描写生动
6. 直接从现有内容末尾开始续写，不要重复已有内容

请继续生成：
";

const REFINE_TEMPLATE: &str = "以下内容存在问题，请修正：

【原内容】
{{output}}

【问题清单】
{{issues}}

【核心设定】
{{core_knowledge}}

【锁定设定】
{{locked_settings}}

请针对问题进行修正，保持其他部分不变。只输出修正后的完整内容。
";

const VALIDATE_TEMPLATE: &str = r#"请作为一名严谨的小说逻辑编辑，检查以下内容是否与设定冲突。

【核心设定】
{{core_knowledge}}

【锁定设定】（绝对不可违背）
{{locked_settings}}

【待校验内容】
{{content}}

请检查：
1. 人物行为是否符合性格设定？
2. 是否违背了世界观的基础规则？
3. 是否与锁定设定产生直接冲突？
4. 时间线和因果逻辑是否通顺？

返回 JSON 格式：
{
    "passed": true/false,
    "issues": ["冲突点1", "冲突点2"],
    "suggestions": ["修改建议1", "修改建议2"]
}
"#;

pub fn intent_prompt(user_input: &str) -> Result<String, NovelistError> {
    PromptTemplate::new(INTENT_TEMPLATE).render(&HashMap::from([(
        "user_input",
        user_input.to_string(),
    )]))
}

/// Continuation prompt when [`AgentState::continues_existing`] holds, the
/// generic generation prompt otherwise.
pub fn generation_prompt(state: &AgentState) -> Result<String, NovelistError> {
    let mut vars = HashMap::from([
        ("user_input", state.user_input.clone()),
        ("core_knowledge", format_bullets(&state.core_knowledge)),
        ("summaries", format_entries(&state.summaries)),
        ("locked_settings", format_entries(&state.locked_settings)),
    ]);
    let template = match state.existing_content.as_deref() {
        Some(existing) if state.continues_existing() => {
            vars.insert("existing_content", existing.to_string());
            CONTINUE_TEMPLATE
        }
        _ => GENERATE_TEMPLATE,
    };
    PromptTemplate::new(template).render(&vars)
}

pub fn refine_prompt(state: &AgentState, issues: &[String]) -> Result<String, NovelistError> {
    PromptTemplate::new(REFINE_TEMPLATE).render(&HashMap::from([
        ("output", state.output.clone()),
        ("issues", format_bullets(issues)),
        ("core_knowledge", format_bullets(&state.core_knowledge)),
        ("locked_settings", format_entries(&state.locked_settings)),
    ]))
}

pub fn validation_prompt(
    content: &str,
    core_knowledge: &[String],
    locked_settings: &novelist_core::ValueMap,
) -> Result<String, NovelistError> {
    PromptTemplate::new(VALIDATE_TEMPLATE).render(&HashMap::from([
        ("content", content.to_string()),
        ("core_knowledge", format_bullets(core_knowledge)),
        ("locked_settings", format_entries(locked_settings)),
    ]))
}
