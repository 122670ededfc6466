use shared::domain::{Question, QuestionId};

fn question(id: i64, text: &str, options: [&str; 4], correct_answer: &str) -> Question {
    Question {
        id: QuestionId(id),
        question: text.to_string(),
        options: options.map(str::to_string),
        correct_answer: correct_answer.to_string(),
    }
}

/// The Java fundamentals bank served when no `questions_path` is configured.
pub fn builtin_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "Which of the following is not a Java primitive data type?",
            ["int", "float", "string", "boolean"],
            "string",
        ),
        question(
            2,
            "What is the output of: System.out.println(5 + '2');",
            ["52", "7", "55", "Error"],
            "55",
        ),
        question(
            3,
            "Which keyword is used to inherit a class in Java?",
            ["extends", "implements", "super", "this"],
            "extends",
        ),
        question(
            4,
            "What is the size of int data type in Java?",
            ["2 bytes", "4 bytes", "8 bytes", "Depends on system"],
            "4 bytes",
        ),
        question(
            5,
            "Which of these is not a valid Java identifier?",
            ["_myVar", "123var", "myVar", "$myVar"],
            "123var",
        ),
        question(
            6,
            "What is the default value of boolean in Java?",
            ["true", "false", "null", "0"],
            "false",
        ),
        question(
            7,
            "Which method is called when an object is created?",
            ["main()", "constructor", "init()", "create()"],
            "constructor",
        ),
        question(
            8,
            "What is the output of: String s = null; System.out.println(s.length());",
            ["0", "null", "NullPointerException", "Error"],
            "NullPointerException",
        ),
        question(
            9,
            "Which of these is not a valid access modifier in Java?",
            ["public", "private", "protected", "internal"],
            "internal",
        ),
        question(
            10,
            "What is the correct way to create an array in Java?",
            [
                "int[] arr = new int[5];",
                "int arr[] = new int[5];",
                "int arr = new int[5];",
                "Both A and B",
            ],
            "Both A and B",
        ),
    ]
}
