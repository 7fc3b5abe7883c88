use super::{AgentSpec, Crew, Process, TaskSpec};

pub const NAME: &str = "research";

/// Researcher gathers material on the user's topic, analyst turns it into a report.
pub fn crew() -> Crew {
    let researcher = AgentSpec::new(
        "researcher",
        "Senior Research Specialist",
        "Find comprehensive and accurate information with a focus on recent developments and \
         key insights",
        "You are an experienced research specialist with a talent for finding relevant \
         information from various sources. You excel at organizing information in a clear and \
         structured manner, making complex topics accessible to others.",
    )
    .with_tools(&["web_search"]);

    let analyst = AgentSpec::new(
        "analyst",
        "Data Analyst and Report Writer",
        "Analyze research findings and create a comprehensive, well-structured report that \
         presents insights in a clear and engaging way",
        "You are a skilled analyst with a background in data interpretation and technical \
         writing. You identify patterns, extract meaningful insights from research data and \
         communicate them through well-crafted reports.",
    );

    let research_task = TaskSpec {
        name: "research_task".to_string(),
        description: "Conduct thorough research on the topic of the user's request: {message}\n\n\
             Current date and time: {current_datetime}\n\n\
             Conversation memory (use it to understand what the user already knows or asked \
             before):\n{zep_context}\n\n\
             Focus on:\n\
             1. Key concepts and definitions\n\
             2. Historical development and recent trends\n\
             3. Major challenges and opportunities\n\
             4. Notable applications or case studies\n\
             5. Future outlook and potential developments"
            .to_string(),
        expected_output: "A research document with well-organized sections covering all the \
             requested aspects, with specific facts, figures, sources and examples."
            .to_string(),
        agent: researcher.key.clone(),
        context: Vec::new(),
    };

    let analysis_task = TaskSpec {
        name: "analysis_task".to_string(),
        description: "Analyze the research findings and write a report answering: {message}\n\n\
             Your report should:\n\
             1. Begin with an executive summary\n\
             2. Include all key information from the research\n\
             3. Provide insightful analysis of trends and patterns\n\
             4. Offer recommendations or future considerations\n\
             5. Use clear headings and a professional, easy-to-read style"
            .to_string(),
        expected_output: "A polished report with an executive summary, main sections and a \
             conclusion, written in the language of the user's message."
            .to_string(),
        agent: analyst.key.clone(),
        context: vec![research_task.name.clone()],
    };

    Crew {
        name: NAME.to_string(),
        agents: vec![researcher, analyst],
        tasks: vec![research_task, analysis_task],
        process: Process::Sequential,
    }
}
