use std::fmt;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request-side enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner     => write!(f, "Beginner"),
            DifficultyLevel::Intermediate => write!(f, "Intermediate"),
            DifficultyLevel::Advanced     => write!(f, "Advanced"),
        }
    }
}

/// Whether an archetype belongs in quick quizzes or longer projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    #[default]
    Quiz,
    Project,
}

impl Purpose {
    /// Lenient parse: trims and ignores case. Unrecognised values are `None`
    /// so the topic's default purpose applies.
    pub fn parse(raw: &str) -> Option<Purpose> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quiz"    => Some(Purpose::Quiz),
            "project" => Some(Purpose::Project),
            _         => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Quiz    => "quiz",
            Purpose::Project => "project",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Exercise kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    SingleChoice,
    MultiChoice,
    Numeric,
    MatrixInput,
    VectorDragTarget,
    VectorDragDot,
    CodeInput,
    TextInput,
    DragReorder,
    VoiceInput,
    WordBankArrange,
    ListenBuild,
    FillBlankChoice,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 13] = [
        ExerciseKind::SingleChoice,
        ExerciseKind::MultiChoice,
        ExerciseKind::Numeric,
        ExerciseKind::MatrixInput,
        ExerciseKind::VectorDragTarget,
        ExerciseKind::VectorDragDot,
        ExerciseKind::CodeInput,
        ExerciseKind::TextInput,
        ExerciseKind::DragReorder,
        ExerciseKind::VoiceInput,
        ExerciseKind::WordBankArrange,
        ExerciseKind::ListenBuild,
        ExerciseKind::FillBlankChoice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::SingleChoice     => "single_choice",
            ExerciseKind::MultiChoice      => "multi_choice",
            ExerciseKind::Numeric          => "numeric",
            ExerciseKind::MatrixInput      => "matrix_input",
            ExerciseKind::VectorDragTarget => "vector_drag_target",
            ExerciseKind::VectorDragDot    => "vector_drag_dot",
            ExerciseKind::CodeInput        => "code_input",
            ExerciseKind::TextInput        => "text_input",
            ExerciseKind::DragReorder      => "drag_reorder",
            ExerciseKind::VoiceInput       => "voice_input",
            ExerciseKind::WordBankArrange  => "word_bank_arrange",
            ExerciseKind::ListenBuild      => "listen_build",
            ExerciseKind::FillBlankChoice  => "fill_blank_choice",
        }
    }

    pub fn parse(raw: &str) -> Option<ExerciseKind> {
        let raw = raw.trim();
        ExerciseKind::ALL.into_iter().find(|k| k.as_str() == raw)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Exercise / expected halves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
}

/// Learner-facing half of a generated item, minus the shared header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseBody {
    SingleChoice { options: Vec<ChoiceOption> },
    MultiChoice { options: Vec<ChoiceOption> },
    Numeric { unit: Option<String> },
    MatrixInput { rows: usize, cols: usize },
    VectorDragTarget { start: Vec<f64>, bound: f64 },
    VectorDragDot { fixed: Vec<f64>, bound: f64 },
    CodeInput { language: String, starter: String },
    TextInput { placeholder: Option<String> },
    DragReorder { items: Vec<String> },
    VoiceInput { locale: String, target_text: String },
    WordBankArrange { bank: Vec<String> },
    ListenBuild { locale: String, audio_text: String, bank: Vec<String> },
    FillBlankChoice { template: String, choices: Vec<String> },
}

impl ExerciseBody {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExerciseBody::SingleChoice { .. }     => ExerciseKind::SingleChoice,
            ExerciseBody::MultiChoice { .. }      => ExerciseKind::MultiChoice,
            ExerciseBody::Numeric { .. }          => ExerciseKind::Numeric,
            ExerciseBody::MatrixInput { .. }      => ExerciseKind::MatrixInput,
            ExerciseBody::VectorDragTarget { .. } => ExerciseKind::VectorDragTarget,
            ExerciseBody::VectorDragDot { .. }    => ExerciseKind::VectorDragDot,
            ExerciseBody::CodeInput { .. }        => ExerciseKind::CodeInput,
            ExerciseBody::TextInput { .. }        => ExerciseKind::TextInput,
            ExerciseBody::DragReorder { .. }      => ExerciseKind::DragReorder,
            ExerciseBody::VoiceInput { .. }       => ExerciseKind::VoiceInput,
            ExerciseBody::WordBankArrange { .. }  => ExerciseKind::WordBankArrange,
            ExerciseBody::ListenBuild { .. }      => ExerciseKind::ListenBuild,
            ExerciseBody::FillBlankChoice { .. }  => ExerciseKind::FillBlankChoice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: ExerciseBody,
}

impl Exercise {
    pub fn kind(&self) -> ExerciseKind {
        self.body.kind()
    }
}

/// Answer key consumed by the grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expected {
    SingleChoice { correct: String },
    MultiChoice { correct: Vec<String> },
    Numeric { value: f64, tolerance: f64 },
    MatrixInput { values: Vec<Vec<f64>>, tolerance: f64 },
    VectorDragTarget { target: Vec<f64>, tolerance: f64 },
    VectorDragDot { dot: f64, tolerance: f64 },
    CodeInput { stdout: String },
    TextInput { accepted: Vec<String>, case_sensitive: bool },
    DragReorder { order: Vec<String> },
    VoiceInput { accepted: Vec<String> },
    WordBankArrange { answer: Vec<String> },
    ListenBuild { answer: Vec<String> },
    FillBlankChoice { correct: String },
}

impl Expected {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            Expected::SingleChoice { .. }     => ExerciseKind::SingleChoice,
            Expected::MultiChoice { .. }      => ExerciseKind::MultiChoice,
            Expected::Numeric { .. }          => ExerciseKind::Numeric,
            Expected::MatrixInput { .. }      => ExerciseKind::MatrixInput,
            Expected::VectorDragTarget { .. } => ExerciseKind::VectorDragTarget,
            Expected::VectorDragDot { .. }    => ExerciseKind::VectorDragDot,
            Expected::CodeInput { .. }        => ExerciseKind::CodeInput,
            Expected::TextInput { .. }        => ExerciseKind::TextInput,
            Expected::DragReorder { .. }      => ExerciseKind::DragReorder,
            Expected::VoiceInput { .. }       => ExerciseKind::VoiceInput,
            Expected::WordBankArrange { .. }  => ExerciseKind::WordBankArrange,
            Expected::ListenBuild { .. }      => ExerciseKind::ListenBuild,
            Expected::FillBlankChoice { .. }  => ExerciseKind::FillBlankChoice,
        }
    }
}

// ---------------------------------------------------------------------------
// Item: exercise + expected built together
// ---------------------------------------------------------------------------

/// A generated exercise paired with its answer key.
///
/// Fields are private: the only way to build an `Item` is through one of the
/// per-kind constructors below, each of which fills both halves at once, so
/// `exercise.kind() == expected.kind()` for every `Item` in existence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    exercise: Exercise,
    expected: Expected,
}

fn exercise(id: impl Into<String>, prompt: impl Into<String>, body: ExerciseBody) -> Exercise {
    Exercise { id: id.into(), prompt: prompt.into(), body }
}

impl Item {
    pub fn single_choice(
        id: impl Into<String>, prompt: impl Into<String>,
        options: Vec<ChoiceOption>, correct: impl Into<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::SingleChoice { options }),
            expected: Expected::SingleChoice { correct: correct.into() },
        }
    }

    pub fn multi_choice(
        id: impl Into<String>, prompt: impl Into<String>,
        options: Vec<ChoiceOption>, correct: Vec<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::MultiChoice { options }),
            expected: Expected::MultiChoice { correct },
        }
    }

    pub fn numeric(
        id: impl Into<String>, prompt: impl Into<String>,
        unit: Option<String>, value: f64, tolerance: f64,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::Numeric { unit }),
            expected: Expected::Numeric { value, tolerance },
        }
    }

    /// Shape of the input grid is taken from `values`.
    pub fn matrix_input(
        id: impl Into<String>, prompt: impl Into<String>,
        values: Vec<Vec<f64>>, tolerance: f64,
    ) -> Item {
        let rows = values.len();
        let cols = values.first().map_or(0, Vec::len);
        Item {
            exercise: exercise(id, prompt, ExerciseBody::MatrixInput { rows, cols }),
            expected: Expected::MatrixInput { values, tolerance },
        }
    }

    pub fn vector_drag_target(
        id: impl Into<String>, prompt: impl Into<String>,
        start: Vec<f64>, bound: f64, target: Vec<f64>, tolerance: f64,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::VectorDragTarget { start, bound }),
            expected: Expected::VectorDragTarget { target, tolerance },
        }
    }

    pub fn vector_drag_dot(
        id: impl Into<String>, prompt: impl Into<String>,
        fixed: Vec<f64>, bound: f64, dot: f64, tolerance: f64,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::VectorDragDot { fixed, bound }),
            expected: Expected::VectorDragDot { dot, tolerance },
        }
    }

    pub fn code_input(
        id: impl Into<String>, prompt: impl Into<String>,
        language: impl Into<String>, starter: impl Into<String>, stdout: impl Into<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::CodeInput {
                language: language.into(),
                starter: starter.into(),
            }),
            expected: Expected::CodeInput { stdout: stdout.into() },
        }
    }

    pub fn text_input(
        id: impl Into<String>, prompt: impl Into<String>,
        placeholder: Option<String>, accepted: Vec<String>, case_sensitive: bool,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::TextInput { placeholder }),
            expected: Expected::TextInput { accepted, case_sensitive },
        }
    }

    /// `items` is the order shown to the learner, `order` the solution.
    pub fn drag_reorder(
        id: impl Into<String>, prompt: impl Into<String>,
        items: Vec<String>, order: Vec<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::DragReorder { items }),
            expected: Expected::DragReorder { order },
        }
    }

    pub fn voice_input(
        id: impl Into<String>, prompt: impl Into<String>,
        locale: impl Into<String>, target_text: impl Into<String>, accepted: Vec<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::VoiceInput {
                locale: locale.into(),
                target_text: target_text.into(),
            }),
            expected: Expected::VoiceInput { accepted },
        }
    }

    pub fn word_bank_arrange(
        id: impl Into<String>, prompt: impl Into<String>,
        bank: Vec<String>, answer: Vec<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::WordBankArrange { bank }),
            expected: Expected::WordBankArrange { answer },
        }
    }

    pub fn listen_build(
        id: impl Into<String>, prompt: impl Into<String>,
        locale: impl Into<String>, audio_text: impl Into<String>,
        bank: Vec<String>, answer: Vec<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::ListenBuild {
                locale: locale.into(),
                audio_text: audio_text.into(),
                bank,
            }),
            expected: Expected::ListenBuild { answer },
        }
    }

    pub fn fill_blank_choice(
        id: impl Into<String>, prompt: impl Into<String>,
        template: impl Into<String>, choices: Vec<String>, correct: impl Into<String>,
    ) -> Item {
        Item {
            exercise: exercise(id, prompt, ExerciseBody::FillBlankChoice {
                template: template.into(),
                choices,
            }),
            expected: Expected::FillBlankChoice { correct: correct.into() },
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.exercise.kind()
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    pub fn into_parts(self) -> (Exercise, Expected) {
        (self.exercise, self.expected)
    }
}

// ---------------------------------------------------------------------------
// Generator output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenMeta {
    pub purpose: Purpose,
}

/// One generated practice item, tagged with the archetype that produced it.
///
/// Serialises as `{archetype, exercise, expected, meta: {purpose}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenOut {
    pub archetype: String,
    #[serde(flatten)]
    item: Item,
    pub meta: GenMeta,
}

impl GenOut {
    pub fn new(archetype: impl Into<String>, item: Item, purpose: Purpose) -> GenOut {
        GenOut {
            archetype: archetype.into(),
            item,
            meta: GenMeta { purpose },
        }
    }

    pub fn exercise(&self) -> &Exercise {
        self.item.exercise()
    }

    pub fn expected(&self) -> &Expected {
        self.item.expected()
    }

    pub fn kind(&self) -> ExerciseKind {
        self.item.kind()
    }

    pub fn purpose(&self) -> Purpose {
        self.meta.purpose
    }

    pub fn item(&self) -> &Item {
        &self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ExerciseKind::ALL {
            assert_eq!(ExerciseKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ExerciseKind::parse("essay"), None);
    }

    #[test]
    fn purpose_parse_is_lenient() {
        assert_eq!(Purpose::parse(" Project "), Some(Purpose::Project));
        assert_eq!(Purpose::parse("QUIZ"), Some(Purpose::Quiz));
        assert_eq!(Purpose::parse("homework"), None);
    }

    #[test]
    fn constructors_keep_kinds_aligned() {
        let items = [
            Item::numeric("n", "2 + 2?", None, 4.0, 0.0),
            Item::matrix_input("m", "I?", vec![vec![1.0, 0.0], vec![0.0, 1.0]], 0.0),
            Item::drag_reorder("d", "order", vec!["b".into(), "a".into()], vec!["a".into(), "b".into()]),
            Item::fill_blank_choice("f", "fill", "print(___)", vec!["x".into()], "x"),
        ];
        for item in &items {
            assert_eq!(item.exercise().kind(), item.expected().kind());
        }
        if let ExerciseBody::MatrixInput { rows, cols } = &items[1].exercise().body {
            assert_eq!((*rows, *cols), (2, 2));
        } else {
            panic!("matrix constructor built the wrong body");
        }
    }

    #[test]
    fn gen_out_serialises_with_kind_tags() {
        let item = Item::single_choice(
            "ex-1",
            "Pick one",
            vec![ChoiceOption { id: "a".into(), text: "A".into() }],
            "a",
        );
        let out = GenOut::new("print_basic", item, Purpose::Quiz);
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["archetype"], "print_basic");
        assert_eq!(value["exercise"]["kind"], "single_choice");
        assert_eq!(value["exercise"]["id"], "ex-1");
        assert_eq!(value["expected"], json!({ "kind": "single_choice", "correct": "a" }));
        assert_eq!(value["meta"], json!({ "purpose": "quiz" }));
    }
}
