use super::{AgentSpec, Crew, Process, TaskSpec};

pub const NAME: &str = "basic";

/// Single assistant that answers the user's message with web search at hand.
pub fn crew() -> Crew {
    let assistant = AgentSpec::new(
        "basic_agent",
        "Helpful Conversational Assistant",
        "Answer the user's message accurately, using what is known about the user and this \
         conversation, and searching the web when current information is needed",
        "You are a friendly assistant with a long-term memory of every conversation you have \
         had with this user. You read that memory carefully before answering, you never invent \
         facts about the user, and you cite web sources when you rely on them.",
    )
    .with_tools(&["web_search"]);

    let task = TaskSpec {
        name: "basic_task".to_string(),
        description: "Reply to the user's latest message.\n\n\
             User message: {message}\n\n\
             Current date and time: {current_datetime}\n\n\
             What memory knows about this user and conversation:\n{zep_context}\n\n\
             Use the memory context when it is relevant (names, preferences, facts stated \
             earlier). Search the web only if the answer depends on information that is not \
             in the context."
            .to_string(),
        expected_output: "A direct, friendly reply to the user's message, written in the \
             language the user wrote in."
            .to_string(),
        agent: assistant.key.clone(),
        context: Vec::new(),
    };

    Crew {
        name: NAME.to_string(),
        agents: vec![assistant],
        tasks: vec![task],
        process: Process::Sequential,
    }
}
