use crate::app::NotesApp;
use crate::config::AppPaths;
use crate::logging::init_tracing;
use crate::models::{Note, NoteDraft, NoteSnapshot, SaveNotePayload};
use tauri::{Emitter, Manager};

#[derive(Clone)]
struct AppState {
    notes: NotesApp,
}

#[tauri::command]
fn notes_list(state: tauri::State<'_, AppState>) -> Vec<Note> {
    state.notes.view_model().all_notes().current().to_vec()
}

#[tauri::command]
async fn note_select(state: tauri::State<'_, AppState>, note_id: i64) -> Result<Option<Note>, String> {
    Ok(state.notes.view_model().select_by_id(note_id).wait().await.flatten())
}

#[tauri::command]
fn note_selection_clear(state: tauri::State<'_, AppState>) {
    state.notes.view_model().clear_selection();
}

#[tauri::command]
async fn note_save(state: tauri::State<'_, AppState>, payload: SaveNotePayload) -> Result<i64, String> {
    let draft = NoteDraft::new(payload.title, payload.content, payload.image_path)
        .normalized()
        .map_err(to_client_error)?;
    let view_model = state.notes.view_model();

    let pending = match payload.id.filter(|id| *id > 0) {
        Some(id) => {
            let existing = view_model.load(id).await.map_err(to_client_error)?;
            view_model.update(existing.revised(draft))
        }
        None => view_model.create(&draft.title, &draft.content, draft.image_path),
    };
    view_model.clear_selection();

    pending
        .wait()
        .await
        .ok_or_else(|| "INTERNAL: note was not saved".to_string())
}

#[tauri::command]
async fn note_delete(state: tauri::State<'_, AppState>, note_id: i64) -> Result<(), String> {
    state
        .notes
        .view_model()
        .delete_by_id(note_id)
        .wait()
        .await
        .ok_or_else(|| "INTERNAL: note was not deleted".to_string())
}

pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir().map_err(|error| error.to_string())?;
            let paths = AppPaths::new(&app_data_dir);
            paths.ensure().map_err(|error| error.to_string())?;
            init_tracing(&paths.logs)?;

            let notes = NotesApp::new(&paths).map_err(|error| error.to_string())?;
            let handle = app.handle().clone();

            tauri::async_runtime::spawn({
                let view_model = notes.view_model();
                async move {
                    let _notes_changed = view_model.all_notes().observe({
                        let handle = handle.clone();
                        move |snapshot: NoteSnapshot| {
                            if let Err(error) = handle.emit("notes_changed", snapshot.as_ref()) {
                                tracing::warn!(error = %error, "failed to forward note list");
                            }
                        }
                    });
                    let _note_selected = view_model.selected_note().observe(move |selected: Option<Note>| {
                        if let Err(error) = handle.emit("note_selected", selected) {
                            tracing::warn!(error = %error, "failed to forward selected note");
                        }
                    });
                    // Forwarding lasts as long as the application.
                    std::future::pending::<()>().await;
                }
            });

            app.manage(AppState { notes });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            notes_list,
            note_select,
            note_selection_clear,
            note_save,
            note_delete
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
