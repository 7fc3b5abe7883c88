use super::{AgentSpec, Crew, Process, TaskSpec};

pub const NAME: &str = "development";

/// Lead engineer that designs agent crews, reading documentation pages on demand.
pub fn crew() -> Crew {
    let leader = AgentSpec::new(
        "leader",
        "Lead Multi-Agent Systems Engineer",
        "Design complete, working multi-agent crews (agents, tasks, tools and orchestration) \
         that solve the user's problem",
        "You have built many production agent systems. You break problems into agents with \
         clear roles, give each the minimum set of tools it needs, and write task descriptions \
         precise enough to be executed without follow-up questions. When you need details about \
         a library or API you read its documentation instead of guessing.",
    )
    .with_tools(&["scrape_website"])
    .with_max_iter(20);

    let task = TaskSpec {
        name: "leader_task".to_string(),
        description: "Design a multi-agent crew for the following request: {message}\n\n\
             Current date and time: {current_datetime}\n\n\
             Conversation memory (earlier requirements and decisions):\n{zep_context}\n\n\
             Read any documentation URL mentioned in the request or memory before relying on it."
            .to_string(),
        expected_output: "A complete crew design: each agent's role, goal, backstory and tools; \
             each task's description, expected output and assigned agent; the execution order; \
             and the code needed to run it."
            .to_string(),
        agent: leader.key.clone(),
        context: Vec::new(),
    };

    Crew {
        name: NAME.to_string(),
        agents: vec![leader],
        tasks: vec![task],
        process: Process::Sequential,
    }
}
