use simpledb::{Cursor, DbResult, Engine, ExecResult, Value};

fn main() -> DbResult<()> {
    println!("Relational Engine Demo\n");

    let mut engine = Engine::new();

    engine.execute(
        "CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
    )?;
    engine.execute(
        "CREATE TABLE tasks (id INTEGER PRIMARY KEY, project_id INTEGER, title TEXT NOT NULL, done BOOLEAN)",
    )?;
    println!("Created tables 'projects' and 'tasks'");

    // Insert data
    println!("Inserting data...");
    engine.execute("INSERT INTO projects (name) VALUES ('website')")?;
    engine.execute("INSERT INTO projects (name) VALUES ('backend')")?;
    engine.execute("INSERT INTO tasks (project_id, title, done) VALUES (0, 'design landing page', FALSE)")?;
    engine.execute("INSERT INTO tasks (project_id, title, done) VALUES (0, 'write copy', TRUE)")?;
    engine.execute("INSERT INTO tasks (project_id, title, done) VALUES (1, 'set up API', FALSE)")?;
    println!("Inserted 2 projects, 3 tasks\n");

    // Filtered read
    println!("Open tasks:");
    let result = engine.execute("SELECT * FROM tasks WHERE done = FALSE")?;
    println!("{result}\n");

    // Join
    println!("Tasks with their project names:");
    let result =
        engine.execute("SELECT * FROM tasks JOIN projects ON tasks.project_id = projects.id")?;
    if let ExecResult::Joined(rows) = &result {
        println!("{:<25} {:<10}", "TASK", "PROJECT");
        println!("{}", "-".repeat(35));
        for row in rows {
            let title = &row["tasks.title"];
            let project = &row["projects.name"];
            println!("{:<25} {:<10}", title.to_string(), project.to_string());
        }
    }
    println!();

    // Mutations report affected counts
    let result = engine.execute("UPDATE tasks SET done = TRUE WHERE project_id = 0")?;
    println!("{result}");
    let result = engine.execute("DELETE FROM tasks WHERE done = TRUE")?;
    println!("{result}\n");

    // Parameterized access through the cursor boundary
    let mut cursor = Cursor::new(&mut engine);
    cursor.execute(
        "INSERT INTO tasks (project_id, title, done) VALUES (?, ?, ?)",
        &[
            Value::Integer(1),
            Value::Text("deploy to staging".into()),
            Value::Boolean(false),
        ],
    )?;
    println!("Cursor insert got row id {:?}", cursor.lastrowid());

    cursor.execute("SELECT * FROM tasks", &[])?;
    println!("Remaining tasks:");
    for row in cursor.fetchall() {
        println!("  - {}", row["title"]);
    }

    // List tables
    println!("\nTables in database:");
    for name in cursor.table_names() {
        println!("  - {name}");
    }

    Ok(())
}
