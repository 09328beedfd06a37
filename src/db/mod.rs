mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;
use crate::sanitize::sanitize;

/// Name given to the assessment synthesized for every committed unit.
pub const ASSESSMENT_NAME: &str = "Unit Assessment";

const MODULE_COLUMNS: &str = "id, name, description, duration, created_at, updated_at";
const UNIT_COLUMNS: &str = "id, module_id, name, description, sequence_number, content, duration_months, created_at, updated_at";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        // WAL journal with enforced foreign keys
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "coursegen")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("coursegen.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Commit
    // ============================================================

    /// Persist a staged course: module, units in order, each unit's
    /// activities plus one synthesized assessment, and the outline.
    ///
    /// Runs in a single transaction, so a failure leaves nothing behind.
    pub fn commit_course(&self, draft: &DraftEntry) -> Result<CommittedCourse> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now();

        // Insert the module first so unit foreign keys resolve

        let module = CourseModule {
            updated_at: now,
            ..draft.module.clone()
        };
        tx.execute(
            "INSERT INTO modules (id, name, description, duration, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                module.id.to_string(),
                &module.name,
                &module.description,
                &module.duration,
                module.created_at.to_rfc3339(),
                module.updated_at.to_rfc3339(),
            ),
        )
        .context("Failed to insert module")?;

        // Units in outline order, each followed by its children
        let assessment_months = module.duration_months();
        let mut units = Vec::with_capacity(draft.units.len());

        for staged in &draft.units {
            let mut unit = Unit {
                module_id: module.id,
                updated_at: now,
                ..staged.clone()
            };

            tx.execute(
                "INSERT INTO units (id, module_id, name, description, sequence_number, content, duration_months, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    unit.id.to_string(),
                    unit.module_id.to_string(),
                    &unit.name,
                    &unit.description,
                    unit.sequence_number,
                    &unit.content,
                    unit.duration_months,
                    unit.created_at.to_rfc3339(),
                    unit.updated_at.to_rfc3339(),
                ),
            )
            .with_context(|| format!("Failed to insert unit '{}'", unit.name))?;

            for activity in unit.activities.iter_mut() {
                activity.unit_id = unit.id;
                tx.execute(
                    "INSERT INTO activities (id, unit_id, name, instructions, duration_minutes)
                     VALUES (?, ?, ?, ?, ?)",
                    (
                        activity.id.to_string(),
                        activity.unit_id.to_string(),
                        &activity.name,
                        &activity.instructions,
                        activity.duration_minutes,
                    ),
                )
                .with_context(|| format!("Failed to insert activity for unit '{}'", unit.name))?;
            }

            // Every unit gets exactly one assessment
            let assessment = Assessment {
                id: Uuid::new_v4(),
                unit_id: unit.id,
                name: ASSESSMENT_NAME.to_string(),
                duration_months: assessment_months,
            };
            tx.execute(
                "INSERT INTO assessments (id, unit_id, name, duration_months) VALUES (?, ?, ?, ?)",
                (
                    assessment.id.to_string(),
                    assessment.unit_id.to_string(),
                    &assessment.name,
                    assessment.duration_months,
                ),
            )
            .with_context(|| format!("Failed to insert assessment for unit '{}'", unit.name))?;
            unit.assessments = vec![assessment];

            units.push(unit);
        }

        // Outline rows keep the unit order by position
        let outline = Outline {
            module_id: module.id,
            unit_ids: units.iter().map(|u| u.id).collect(),
            ..draft.outline.clone()
        };
        tx.execute(
            "INSERT INTO outlines (id, name, module_id, created_at) VALUES (?, ?, ?, ?)",
            (
                outline.id.to_string(),
                &outline.name,
                outline.module_id.to_string(),
                outline.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to insert outline")?;

        for (position, unit_id) in outline.unit_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO outline_units (outline_id, unit_id, position) VALUES (?, ?, ?)",
                (outline.id.to_string(), unit_id.to_string(), position as i64),
            )?;
        }

        tx.commit().context("Failed to commit course")?;

        tracing::info!(
            course_id = %draft.course_id,
            module_id = %module.id,
            units = units.len(),
            "Committed course"
        );

        Ok(CommittedCourse {
            course_id: draft.course_id,
            outline,
            module,
            units,
        })
    }

    // ============================================================
    // Module operations
    // ============================================================

    pub fn get_all_modules(&self) -> Result<Vec<CourseModule>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {MODULE_COLUMNS} FROM modules ORDER BY name"
        ))?;

        let modules = stmt
            .query_map([], module_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(modules)
    }

    /// Modules whose name contains `query`, case-insensitively.
    pub fn search_modules(&self, query: &str) -> Result<Vec<CourseModule>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {MODULE_COLUMNS} FROM modules
             WHERE name LIKE '%' || ? || '%' COLLATE NOCASE ORDER BY name"
        ))?;

        let modules = stmt
            .query_map([query], module_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(modules)
    }

    pub fn get_module(&self, id: Uuid) -> Result<Option<CourseModule>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_module(&conn, id)
    }

    pub fn get_module_tree(&self, id: Uuid) -> Result<Option<ModuleTree>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(module) = find_module(&conn, id)? else {
            return Ok(None);
        };
        let units = find_units_by_module(&conn, id)?;
        Ok(Some(ModuleTree { module, units }))
    }

    /// Delete a module. Units, activities, assessments and outlines cascade.
    pub fn delete_module(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM modules WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Unit operations
    // ============================================================

    pub fn get_all_units(&self) -> Result<Vec<Unit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {UNIT_COLUMNS} FROM units ORDER BY module_id, sequence_number"
        ))?;

        let mut units = stmt
            .query_map([], unit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for unit in units.iter_mut() {
            load_unit_children(&conn, unit)?;
        }

        Ok(units)
    }

    /// Units of a module in presentation order.
    pub fn get_units_by_module(&self, module_id: Uuid) -> Result<Vec<Unit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_units_by_module(&conn, module_id)
    }

    pub fn get_unit(&self, id: Uuid) -> Result<Option<Unit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_unit(&conn, id)
    }

    /// Administrative partial update. Replacement content is sanitized.
    pub fn update_unit(&self, id: Uuid, input: UpdateUnitInput) -> Result<Option<Unit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = find_unit(&conn, id)? else {
            return Ok(None);
        };

        // Merge the partial input over the stored row
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let content = input
            .content
            .map(|c| sanitize(&c))
            .unwrap_or(existing.content);
        let duration_months = input.duration_months.or(existing.duration_months);

        conn.execute(
            "UPDATE units SET name = ?, description = ?, content = ?, duration_months = ?, updated_at = ?
             WHERE id = ?",
            (
                &name,
                &description,
                &content,
                duration_months,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        find_unit(&conn, id)
    }

    /// Replace a unit's content with `rewrite(current)`, holding the
    /// connection lock from read to write so concurrent rewrites of the same
    /// unit apply one after the other. The rewritten text is stored verbatim.
    pub fn update_unit_content_with<F>(&self, id: Uuid, rewrite: F) -> Result<Option<Unit>>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = find_unit(&conn, id)? else {
            return Ok(None);
        };

        // A failed rewrite leaves the row untouched
        let content = rewrite(&existing.content)?;

        conn.execute(
            "UPDATE units SET content = ?, updated_at = ? WHERE id = ?",
            (&content, Utc::now().to_rfc3339(), id.to_string()),
        )?;

        find_unit(&conn, id)
    }

    /// Overwrite a unit's content verbatim.
    pub fn update_unit_content(&self, id: Uuid, content: &str) -> Result<Option<Unit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE units SET content = ?, updated_at = ? WHERE id = ?",
            (content, Utc::now().to_rfc3339(), id.to_string()),
        )?;

        if rows == 0 {
            return Ok(None);
        }
        find_unit(&conn, id)
    }

    // ============================================================
    // Activity and assessment operations
    // ============================================================

    pub fn get_activities_by_module(&self, module_id: Uuid) -> Result<Vec<Activity>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT a.id, a.unit_id, a.name, a.instructions, a.duration_minutes
             FROM activities a JOIN units u ON u.id = a.unit_id
             WHERE u.module_id = ? ORDER BY u.sequence_number",
        )?;

        let activities = stmt
            .query_map([module_id.to_string()], activity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }

    pub fn get_assessments_by_module(&self, module_id: Uuid) -> Result<Vec<Assessment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT a.id, a.unit_id, a.name, a.duration_months
             FROM assessments a JOIN units u ON u.id = a.unit_id
             WHERE u.module_id = ? ORDER BY u.sequence_number",
        )?;

        let assessments = stmt
            .query_map([module_id.to_string()], assessment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assessments)
    }

    // ============================================================
    // Outline operations
    // ============================================================

    pub fn get_outline(&self, id: Uuid) -> Result<Option<Outline>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let outline = conn
            .query_row(
                "SELECT id, name, module_id, created_at FROM outlines WHERE id = ?",
                [id.to_string()],
                |row| {
                    Ok(Outline {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        module_id: parse_uuid(row.get::<_, String>(2)?),
                        unit_ids: Vec::new(),
                        created_at: parse_datetime(row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;

        let Some(mut outline) = outline else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT unit_id FROM outline_units WHERE outline_id = ? ORDER BY position",
        )?;
        outline.unit_ids = stmt
            .query_map([id.to_string()], |row| Ok(parse_uuid(row.get::<_, String>(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(outline))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn find_module(conn: &Connection, id: Uuid) -> Result<Option<CourseModule>> {
    let module = conn
        .query_row(
            &format!("SELECT {MODULE_COLUMNS} FROM modules WHERE id = ?"),
            [id.to_string()],
            module_from_row,
        )
        .optional()?;
    Ok(module)
}

fn find_unit(conn: &Connection, id: Uuid) -> Result<Option<Unit>> {
    let unit = conn
        .query_row(
            &format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = ?"),
            [id.to_string()],
            unit_from_row,
        )
        .optional()?;

    match unit {
        Some(mut unit) => {
            load_unit_children(conn, &mut unit)?;
            Ok(Some(unit))
        }
        None => Ok(None),
    }
}

fn find_units_by_module(conn: &Connection, module_id: Uuid) -> Result<Vec<Unit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {UNIT_COLUMNS} FROM units WHERE module_id = ? ORDER BY sequence_number"
    ))?;

    let mut units = stmt
        .query_map([module_id.to_string()], unit_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for unit in units.iter_mut() {
        load_unit_children(conn, unit)?;
    }

    Ok(units)
}

fn load_unit_children(conn: &Connection, unit: &mut Unit) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, unit_id, name, instructions, duration_minutes
         FROM activities WHERE unit_id = ? ORDER BY rowid",
    )?;
    unit.activities = stmt
        .query_map([unit.id.to_string()], activity_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, unit_id, name, duration_months
         FROM assessments WHERE unit_id = ? ORDER BY rowid",
    )?;
    unit.assessments = stmt
        .query_map([unit.id.to_string()], assessment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(())
}

fn module_from_row(row: &Row) -> rusqlite::Result<CourseModule> {
    Ok(CourseModule {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        duration: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn unit_from_row(row: &Row) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: parse_uuid(row.get::<_, String>(0)?),
        module_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        sequence_number: row.get(4)?,
        content: row.get(5)?,
        duration_months: row.get(6)?,
        activities: Vec::new(),
        assessments: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: parse_uuid(row.get::<_, String>(0)?),
        unit_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        instructions: row.get(3)?,
        duration_minutes: row.get(4)?,
    })
}

fn assessment_from_row(row: &Row) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: parse_uuid(row.get::<_, String>(0)?),
        unit_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        duration_months: row.get(3)?,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
