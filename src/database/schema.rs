pub const CURRENT_SCHEMA: &str = r#"
PRAGMA foreign_keys = 1;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'trainer'
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    token TEXT NOT NULL UNIQUE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    expires_at TIMESTAMP NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS kartes (
    id INTEGER PRIMARY KEY,
    player_id INTEGER,
    date TEXT NOT NULL,
    trainer_note TEXT,
    time_loss_category TEXT,
    diagnosis_flag BOOLEAN NOT NULL DEFAULT FALSE,
    subjective TEXT,
    objective TEXT,
    assessment TEXT,
    plan TEXT,
    activity TEXT,
    timing TEXT,
    age TEXT,
    status TEXT,
    mechanism TEXT,
    injury_type TEXT,
    injury_site TEXT,
    position TEXT,
    onset_style TEXT,
    report_flag BOOLEAN NOT NULL DEFAULT FALSE,
    injury_name TEXT,
    participation_status TEXT,
    return_est TEXT,
    progress_note TEXT,
    FOREIGN KEY (player_id) REFERENCES players (id)
);
"#;
