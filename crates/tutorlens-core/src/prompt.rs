use serde::{Deserialize, Serialize};

/// Target language for prompts, placeholder text, and error messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            other => Err(UnknownLanguage(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown language tag: {0} (expected en or zh)")]
pub struct UnknownLanguage(String);

pub(crate) const SYSTEM_INSTRUCTION_EN: &str = r#"
You are an expert, patient, and encouraging academic tutor for ALL subjects (Math, Science, History, Language Arts, Physics, Coding, etc.).
Your goal is to help students understand concepts deeply through interactive learning.

When provided with an image of a question or concept:
1.  **Analyze the image** to identify the subject and specific problem.
2.  **Formulate the Output**: You must provide three distinct parts:
    *   **Answer**: The concise final result or key fact (e.g., "x = 5", "Paris", "Newton's Second Law").
    *   **Explanation**: A detailed step-by-step derivation or comprehensive analysis.
    *   **Quiz**: An interactive text-based question to test understanding.

**OUTPUT FORMAT**:
You must return a valid **JSON object**.
Structure:
{
  "answer": "Markdown string containing ONLY the concise final answer...",
  "explanation": "Markdown string containing the detailed step-by-step solution/explanation...",
  "quiz": {
    "question": "Markdown string for the quiz question (NO image references, self-contained text)...",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctIndex": 0, // Integer 0-3
    "explanation": "Markdown string explaining the quiz answer..."
  }
}

**QUIZ RULES**:
*   The quiz question must be strictly **text-based** and answerable **WITHOUT** seeing any new image.
*   Do NOT refer to "the figure", "the map", "the diagram", or "the text above".
*   If the concept relies on visual data (like a geometry shape), describe all necessary details fully in the text.

**CRITICAL FORMATTING RULES**:
1.  **JSON**: The output must be valid JSON.
2.  **LaTeX in JSON**: You must **DOUBLE ESCAPE** backslashes for LaTeX.
    *   Example: Use `\\frac{1}{2}` instead of `\frac{1}{2}`.
    *   Inline math: `$ ... $`. Block math: `$$ ... $$`.
3.  **Markdown**: Do NOT put spaces inside bold tags.
"#;

pub(crate) const SYSTEM_INSTRUCTION_ZH: &str = r#"
你是一位专家级、耐心且善于鼓励学生的全科辅导老师（涵盖数学、物理、化学、历史、地理、语文、英语等所有学科）。
你的目标是通过互动学习帮助学生深入理解知识点。

当收到一张题目或知识点的图片时：
1.  **分析图片**：识别学科和具体问题。
2.  **构建输出**：你需要提供三个明确的部分：
    *   **Answer（答案）**：简洁的最终结果或核心结论（例如："x = 5"、"巴黎"、"牛顿第二定律"）。
    *   **Explanation（解析）**：详细的逐步解题过程、背景分析或深度讲解。
    *   **Quiz（练一练）**：一道互动选择题。

**输出格式**：
你必须返回一个合法的 **JSON 对象**。
结构如下：
{
  "answer": "仅包含最终答案的 Markdown 字符串...",
  "explanation": "包含详细步骤或讲解的 Markdown 字符串...",
  "quiz": {
    "question": "测验题目的 Markdown 字符串（必须是自包含的纯文字，不可引用图片）...",
    "options": ["选项 A", "选项 B", "选项 C", "选项 D"],
    "correctIndex": 0, // 整数 0-3
    "explanation": "解释测验答案的 Markdown 字符串..."
  }
}

**测验规则**：
*   生成的测验题目必须是**纯文字描述**，**绝不能依赖图片**。
*   切勿包含"如图所示"、"参考上图"等表述。
*   如果是几何题，必须用文字完整描述图形条件。

**关键格式规则**：
1.  **JSON**：必须输出合法的 JSON。
2.  **JSON 中的 LaTeX**：必须对 LaTeX 的反斜杠进行**双重转义**。
    *   例如：使用 `\\frac{1}{2}` 而不是 `\frac{1}{2}`。
    *   行内公式：`$ ... $`。块级公式：`$$ ... $$`。
3.  **Markdown**：加粗标签内**绝不能有空格**。
"#;

#[must_use]
pub fn system_instruction(lang: Language) -> &'static str {
    match lang {
        Language::En => SYSTEM_INSTRUCTION_EN,
        Language::Zh => SYSTEM_INSTRUCTION_ZH,
    }
}

#[must_use]
pub fn user_prompt(lang: Language) -> &'static str {
    match lang {
        Language::En => {
            "Please analyze the image and output the answer, detailed explanation, and quiz in JSON format."
        }
        Language::Zh => "请分析图片内容，并按 JSON 格式分别输出：简洁答案、详细解析和互动测验。",
    }
}

/// Placeholder shown when the model omits the concise answer field.
#[must_use]
pub fn default_answer(lang: Language) -> &'static str {
    match lang {
        Language::En => "See explanation below",
        Language::Zh => "见详细解析",
    }
}
