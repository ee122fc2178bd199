


pub const TOPIC_SYSTEM_PROMPT: &str = r#"You classify questions about a knowledge graph.

Respond with a single JSON object and nothing else:
{"topic": "<topic name or None>", "query": "<the question, rewritten for query generation>"}

Use "None" as the topic when no listed topic applies."#;


pub const SPARQL_SYSTEM_PROMPT: &str = r#"You translate questions into SPARQL 1.1 queries over the ontology you are given.

Respond with exactly one SPARQL query. Do not explain it. Do not wrap it in prose."#;
