//! System directive for quiz-solving runs

use trawl_agent::TERMINAL_MARKER;

/// Submission identity embedded in the directive
#[derive(Debug, Clone)]
pub struct Submitter {
    pub email: String,
    pub secret: String,
}

/// Build the system directive based on the registered tools
pub fn build_system_prompt(submitter: &Submitter, tool_names: &[&str]) -> String {
    let mut prompt = String::from("You are trawl, an autonomous quiz-solving agent.\n\n");

    prompt.push_str("Your job:\n");
    prompt.push_str("1. Load the quiz page at the given URL with get_rendered_html (pages need JavaScript).\n");
    prompt.push_str("2. Extract every instruction, required parameter, submission rule and the submit endpoint.\n");
    prompt.push_str("3. Solve the task exactly as asked.\n");
    prompt.push_str("4. Submit the answer with post_request to the endpoint the page names.\n");
    prompt.push_str("5. Read the server response. If it contains a \"url\" field, fetch that NEW url next and solve it. ");
    prompt.push_str("Never fetch the same quiz url twice.\n\n");

    if !tool_names.is_empty() {
        prompt.push_str("Tools:\n");
        for name in tool_names {
            if let Some(hint) = tool_hint(name) {
                prompt.push_str(&format!("- {}: {}\n", name, hint));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str("URL rules:\n");
    prompt.push_str("- The base URL is the origin of the quiz page you are solving ");
    prompt.push_str("(https://host.example/q1.html has base https://host.example).\n");
    prompt.push_str("- Prepend the base URL to relative paths such as /submit.\n");
    prompt.push_str("- Always pass full https:// URLs to post_request.\n\n");

    prompt.push_str("Submission format: a JSON object with keys email, secret, url, answer.\n");
    prompt.push_str(&format!("- email: {}\n", submitter.email));
    prompt.push_str(&format!("- secret: {}\n", submitter.secret));
    prompt.push_str("- url: the quiz page url you are solving\n");
    prompt.push_str("- answer: your computed answer in the format the page asks for, never empty\n");
    prompt.push_str("- Entry pages that only hand out the first question accept any non-empty answer such as \"start\".\n\n");

    prompt.push_str("Rules:\n");
    prompt.push_str("- Never invent URLs, endpoints, fields or values.\n");
    prompt.push_str("- If an answer is wrong, work it out again and resubmit.\n");
    prompt.push_str("- Each task has a hard three-minute limit.\n");
    prompt.push_str("- Keep going until a server response contains no new url.\n\n");

    prompt.push_str(&format!(
        "When, and only when, a response contains no new url, reply with exactly: {}",
        TERMINAL_MARKER
    ));

    prompt
}

fn tool_hint(name: &str) -> Option<&'static str> {
    match name {
        "get_rendered_html" => Some("fetch a page after its JavaScript has run"),
        "download_file" => Some("save a file (.csv, .pdf, .zip, .png, ...) to the work directory"),
        "post_request" => Some("submit an answer as JSON"),
        "run_code" => Some("run Python or bash code to compute an answer"),
        "add_dependencies" => Some("install Python packages needed by run_code"),
        "transcribe_audio" => Some("turn an audio file into text"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitter() -> Submitter {
        Submitter {
            email: "student@example.com".into(),
            secret: "s3cret".into(),
        }
    }

    #[test]
    fn test_prompt_embeds_credentials_and_marker() {
        let prompt = build_system_prompt(&submitter(), &["post_request"]);
        assert!(prompt.contains("email: student@example.com"));
        assert!(prompt.contains("secret: s3cret"));
        assert!(prompt.ends_with("reply with exactly: END"));
    }

    #[test]
    fn test_prompt_lists_only_registered_tools() {
        let prompt = build_system_prompt(&submitter(), &["run_code"]);
        assert!(prompt.contains("- run_code: "));
        assert!(!prompt.contains("- transcribe_audio: "));
    }
}
