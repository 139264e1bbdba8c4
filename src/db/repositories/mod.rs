mod pomodoro_sessions;
mod study_sessions;
